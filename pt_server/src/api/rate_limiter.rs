//! Sliding-window limits for commands arriving over a WebSocket.
//!
//! A stuck button on a moderator device must not flood the session actor.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// One sliding window
#[derive(Debug)]
struct Window {
    timestamps: VecDeque<Instant>,
    max_requests: usize,
    span: Duration,
}

impl Window {
    fn new(max_requests: usize, span: Duration) -> Self {
        Self {
            timestamps: VecDeque::with_capacity(max_requests),
            max_requests,
            span,
        }
    }

    fn evict(&mut self, now: Instant) {
        while let Some(ts) = self.timestamps.front() {
            if now.duration_since(*ts) >= self.span {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    fn is_full(&self) -> bool {
        self.timestamps.len() >= self.max_requests
    }
}

/// Which window rejected a command
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Limit {
    Burst,
    Sustained,
}

/// Burst and sustained windows checked together.
///
/// A command counts against both windows only when both admit it.
#[derive(Debug)]
pub struct CommandLimiter {
    burst: Window,
    sustained: Window,
}

impl Default for CommandLimiter {
    /// 10 commands per second, 120 per minute
    fn default() -> Self {
        Self::new(10, Duration::from_secs(1), 120, Duration::from_secs(60))
    }
}

impl CommandLimiter {
    pub fn new(
        burst_max: usize,
        burst_span: Duration,
        sustained_max: usize,
        sustained_span: Duration,
    ) -> Self {
        Self {
            burst: Window::new(burst_max, burst_span),
            sustained: Window::new(sustained_max, sustained_span),
        }
    }

    /// Admit one command or name the limit it hit.
    ///
    /// ```
    /// # use pt_server::api::rate_limiter::{CommandLimiter, Limit};
    /// # use std::time::Duration;
    /// let mut limiter =
    ///     CommandLimiter::new(2, Duration::from_secs(1), 100, Duration::from_secs(60));
    /// assert!(limiter.check().is_ok());
    /// assert!(limiter.check().is_ok());
    /// assert_eq!(limiter.check(), Err(Limit::Burst));
    /// ```
    pub fn check(&mut self) -> Result<(), Limit> {
        let now = Instant::now();
        self.burst.evict(now);
        self.sustained.evict(now);

        if self.burst.is_full() {
            return Err(Limit::Burst);
        }
        if self.sustained.is_full() {
            return Err(Limit::Sustained);
        }

        self.burst.timestamps.push_back(now);
        self.sustained.timestamps.push_back(now);
        Ok(())
    }

    /// Commands still allowed before the tighter window fills
    pub fn remaining(&self) -> usize {
        let burst = self.burst.max_requests - self.burst.timestamps.len();
        let sustained = self.sustained.max_requests - self.sustained.timestamps.len();
        burst.min(sustained)
    }
}
