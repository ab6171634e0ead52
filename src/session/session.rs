use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::config::SessionConfig;
use super::stats::SessionStats;
use crate::audio::{AudioBackend, AudioClip, ClipRecorder};

/// Recording session lifecycle.
///
/// `Denied` is terminal: microphone acquisition failed and the session
/// cannot be retried without a fresh user invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Recording,
    Stopped,
    Denied,
}

/// Live feeds handed out by `start()`.
///
/// Both channels close when the session stops, which is what cancels
/// their consumers.
#[derive(Debug)]
pub struct SessionFeeds {
    /// Raw sample frames for the visualization loop (lossy)
    pub frames: mpsc::Receiver<Vec<i16>>,
    /// Elapsed whole seconds, once per second
    pub ticks: mpsc::Receiver<u64>,
}

/// A recording session that owns the audio backend, the ordered capture
/// of frames into a clip, the elapsed-time ticker, and the visualization
/// feed.
///
/// Sessions are one-shot: `Idle -> Recording -> Stopped`, with `Denied`
/// as the failure terminal. A new recording means a new session; the
/// caller stops the previous one first, which releases the device before
/// it can be reacquired.
pub struct RecordingSession {
    config: SessionConfig,
    state: SessionState,
    backend: Box<dyn AudioBackend>,
    started_at: Option<DateTime<Utc>>,

    /// Cancel flag observed by the forward and ticker tasks
    recording_flag: Arc<AtomicBool>,

    /// Number of capture frames appended so far
    frames_captured: Arc<AtomicUsize>,

    forward_task: Option<JoinHandle<()>>,
    recorder_task: Option<JoinHandle<Result<AudioClip>>>,
    ticker_task: Option<JoinHandle<()>>,

    clip: Option<AudioClip>,
}

impl RecordingSession {
    pub fn new(config: SessionConfig, backend: Box<dyn AudioBackend>) -> Self {
        Self {
            config,
            state: SessionState::Idle,
            backend,
            started_at: None,
            recording_flag: Arc::new(AtomicBool::new(false)),
            frames_captured: Arc::new(AtomicUsize::new(0)),
            forward_task: None,
            recorder_task: None,
            ticker_task: None,
            clip: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.config.session_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Start recording
    pub async fn start(&mut self) -> Result<SessionFeeds> {
        match self.state {
            SessionState::Idle => {}
            SessionState::Recording => bail!("Recording already in progress"),
            SessionState::Stopped | SessionState::Denied => {
                bail!("Session is finished; start a new one")
            }
        }

        info!("Starting recording session: {}", self.config.session_id);

        let mut audio_rx = match self.backend.start().await {
            Ok(rx) => rx,
            Err(e) => {
                self.state = SessionState::Denied;
                return Err(e);
            }
        };

        self.started_at = Some(Utc::now());
        self.recording_flag.store(true, Ordering::SeqCst);

        let (viz_tx, viz_rx) = mpsc::channel::<Vec<i16>>(8);
        let (clip_tx, clip_rx) = mpsc::channel(100);
        let (tick_tx, tick_rx) = mpsc::channel(8);

        // Forward task: fan each capture frame out to the clip recorder
        // (lossless, ordered) and the visualization feed (lossy). Its
        // senders drop on exit, closing both downstream channels.
        let recording_flag = Arc::clone(&self.recording_flag);
        let frames_captured = Arc::clone(&self.frames_captured);

        self.forward_task = Some(tokio::spawn(async move {
            while let Some(frame) = audio_rx.recv().await {
                if !recording_flag.load(Ordering::SeqCst) {
                    break;
                }

                let _ = viz_tx.try_send(frame.samples.clone());

                if clip_tx.send(frame).await.is_err() {
                    error!("Clip recorder dropped its channel");
                    break;
                }

                frames_captured.fetch_add(1, Ordering::SeqCst);
            }
        }));

        // Recorder task: accumulates frames until the channel closes,
        // then finalizes them into the clip.
        let recorder = ClipRecorder::new(self.config.sample_rate, self.config.channels);
        self.recorder_task = Some(tokio::spawn(recorder.record(clip_rx)));

        // Ticker task: elapsed-time display, once per second.
        let recording_flag = Arc::clone(&self.recording_flag);
        self.ticker_task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            interval.tick().await; // first tick completes immediately

            let mut elapsed = 0u64;
            loop {
                interval.tick().await;
                if !recording_flag.load(Ordering::SeqCst) {
                    break;
                }
                elapsed += 1;
                if tick_tx.send(elapsed).await.is_err() {
                    break;
                }
            }
        }));

        self.state = SessionState::Recording;

        info!("Recording session started");

        Ok(SessionFeeds {
            frames: viz_rx,
            ticks: tick_rx,
        })
    }

    /// Stop recording, release the device, and finalize the clip.
    ///
    /// Idempotent: calling on a session that is not `Recording` performs
    /// no teardown at all.
    pub async fn stop(&mut self) -> Result<()> {
        if self.state != SessionState::Recording {
            return Ok(());
        }

        info!("Stopping recording session: {}", self.config.session_id);

        self.recording_flag.store(false, Ordering::SeqCst);

        // Release the device first; closing the capture channel is what
        // drains the forward task out.
        let backend_result = self.backend.stop().await;

        if let Some(task) = self.forward_task.take() {
            if let Err(e) = task.await {
                error!("Forward task panicked: {}", e);
            }
        }

        if let Some(task) = self.recorder_task.take() {
            match task.await {
                Ok(Ok(clip)) => self.clip = Some(clip),
                Ok(Err(e)) => error!("Failed to finalize clip: {}", e),
                Err(e) => error!("Recorder task panicked: {}", e),
            }
        }

        if let Some(task) = self.ticker_task.take() {
            task.abort();
            let _ = task.await;
        }

        self.state = SessionState::Stopped;

        info!("Recording session stopped");

        backend_result
    }

    /// Take the finalized clip, once stopped. Set exactly once, on the
    /// transition to `Stopped`.
    pub fn take_clip(&mut self) -> Option<AudioClip> {
        self.clip.take()
    }

    /// Get current session statistics
    pub fn stats(&self) -> SessionStats {
        let elapsed_secs = self
            .started_at
            .map(|t| {
                Utc::now()
                    .signed_duration_since(t)
                    .num_seconds()
                    .max(0) as u64
            })
            .unwrap_or(0);

        SessionStats {
            is_recording: self.state == SessionState::Recording,
            started_at: self.started_at,
            elapsed_secs,
            frames_captured: self.frames_captured.load(Ordering::SeqCst),
        }
    }
}
