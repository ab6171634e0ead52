pub mod app;
pub mod audio;
pub mod config;
pub mod gateway;
pub mod live;
pub mod session;
pub mod ui;
pub mod viz;

pub use audio::{
    AudioBackend, AudioBackendConfig, AudioClip, AudioFile, AudioFrame, ClipRecorder,
    MicrophoneBackend,
};
pub use config::Config;
pub use gateway::{ClassificationOutcome, Classifier, Label, PredictionClient};
pub use live::{LiveAnalyzer, LiveUpdate};
pub use session::{RecordingSession, SessionConfig, SessionFeeds, SessionState, SessionStats};
pub use viz::SpectrumAnalyzer;
