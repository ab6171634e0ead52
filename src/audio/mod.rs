pub mod backend;
pub mod clip;
pub mod file;
pub mod microphone;

pub use backend::{AudioBackend, AudioBackendConfig, AudioFrame};
pub use clip::{AudioClip, ClipRecorder};
pub use file::{AudioFile, ALLOWED_EXTENSIONS, MAX_UPLOAD_BYTES};
pub use microphone::MicrophoneBackend;
