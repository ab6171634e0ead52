use serde::{Deserialize, Serialize};

/// Configuration for a recording session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Unique session identifier
    pub session_id: String,

    /// Sample rate for captured audio
    pub sample_rate: u32,

    /// Number of audio channels (1 = mono)
    pub channels: u16,

    /// Capture buffer size in milliseconds
    pub buffer_duration_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: format!("recording-{}", uuid::Uuid::new_v4()),
            sample_rate: 16000, // matches the transcription side of the service
            channels: 1,        // Mono
            buffer_duration_ms: 100,
        }
    }
}
