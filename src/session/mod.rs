//! Recording session management
//!
//! This module provides the `RecordingSession` abstraction that manages:
//! - Microphone capture through an `AudioBackend`
//! - Ordered accumulation of frames into a finalized clip
//! - The elapsed-time ticker and the visualization feed
//! - Session state and teardown on every exit path

mod config;
mod session;
mod stats;

pub use config::SessionConfig;
pub use session::{RecordingSession, SessionFeeds, SessionState};
pub use stats::{format_elapsed, SessionStats};
