//! Audio playback collaborator.
//!
//! The session hands each round's media to an [`AudioPlayer`] together
//! with a [`PlaybackDone`] token. Calling [`PlaybackDone::finish`] reports
//! the end of playback; the token is consumed, so it can fire at most once.
//! Dropping it unfinished reports nothing and the moderator has to advance
//! the round by hand.

use log::debug;
use std::{
    sync::{Mutex, PoisonError},
    time::Duration,
};
use tokio::sync::oneshot;

use crate::game::MediaRef;

#[derive(Debug)]
pub struct PlaybackDone {
    tx: oneshot::Sender<()>,
}

impl PlaybackDone {
    /// Creates a token and the receiver that resolves when it fires.
    #[must_use]
    pub fn channel() -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    pub fn finish(self) {
        if self.tx.send(()).is_err() {
            debug!("playback finished after the session moved on");
        }
    }
}

pub trait AudioPlayer: Send + Sync {
    /// Starts playing `media`. Must not block.
    fn play(&self, media: MediaRef, duration_hint: Duration, done: PlaybackDone);
}

/// Pretends to play for `duration_hint`, then reports completion. Used
/// when the actual audio runs on the moderator device.
#[derive(Clone, Copy, Debug, Default)]
pub struct TimedAudio;

impl AudioPlayer for TimedAudio {
    fn play(&self, media: MediaRef, duration_hint: Duration, done: PlaybackDone) {
        debug!("playing {} for {:?}", media.uri, duration_hint);
        tokio::spawn(async move {
            tokio::time::sleep(duration_hint).await;
            done.finish();
        });
    }
}

/// Holds the current track until someone calls [`ManualAudio::finish`].
#[derive(Debug, Default)]
pub struct ManualAudio {
    current: Mutex<Option<(MediaRef, PlaybackDone)>>,
}

impl ManualAudio {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The track currently "playing", if any.
    pub fn now_playing(&self) -> Option<MediaRef> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|(media, _)| media.clone())
    }

    /// Reports the end of the current track. Returns whether a track was
    /// playing.
    pub fn finish(&self) -> bool {
        let current = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match current {
            Some((_, done)) => {
                done.finish();
                true
            }
            None => false,
        }
    }
}

impl AudioPlayer for ManualAudio {
    fn play(&self, media: MediaRef, _duration_hint: Duration, done: PlaybackDone) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some((media, done));
    }
}
