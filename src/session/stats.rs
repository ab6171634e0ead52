use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of a recording session's progress
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    /// Whether recording is currently active
    pub is_recording: bool,

    /// When the recording started, if it ever did
    pub started_at: Option<DateTime<Utc>>,

    /// Elapsed recording time in seconds
    pub elapsed_secs: u64,

    /// Number of capture frames appended so far
    pub frames_captured: usize,
}

/// Format elapsed seconds for the recording indicator, e.g. "1:07"
pub fn format_elapsed(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_label_zero_pads() {
        assert_eq!(format_elapsed(0), "0:00");
        assert_eq!(format_elapsed(7), "0:07");
        assert_eq!(format_elapsed(67), "1:07");
        assert_eq!(format_elapsed(600), "10:00");
    }
}
