//! HTTP/WebSocket front end for the party trivia session engine.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
