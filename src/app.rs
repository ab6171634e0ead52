//! Command flows: wiring config and gateway into the interactive
//! terminal frontends.

use anyhow::{Context, Result};
use crossterm::event::{Event, EventStream, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::style::Stylize;
use crossterm::terminal;
use futures::StreamExt;
use std::io::{stdout, Stdout, Write};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::warn;

use crate::audio::{file, AudioBackendConfig, AudioFile, MicrophoneBackend};
use crate::config::Config;
use crate::gateway::{ClassificationOutcome, Classifier, PredictionClient};
use crate::live::{LiveAnalyzer, LiveUpdate};
use crate::session::{format_elapsed, RecordingSession, SessionConfig};
use crate::ui::{live_line, Feedback, Indicator};
use crate::viz::{self, render_bars, SpectrumAnalyzer};

/// Reject empty or whitespace-only submissions before any network call.
pub fn validate_message(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Restores the terminal on every exit path out of an interactive mode.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> Result<Self> {
        terminal::enable_raw_mode().context("Failed to enable raw terminal mode")?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

pub struct App {
    config: Config,
    client: Arc<PredictionClient>,
    feedback: Feedback<Stdout>,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let client = PredictionClient::new(
            &config.service.endpoint.base_url,
            Duration::from_secs(config.service.endpoint.timeout_secs),
        )?;

        Ok(Self {
            config,
            client: Arc::new(client),
            feedback: Feedback::new(stdout()),
        })
    }

    /// Probe the service and reflect it in the status indicator.
    pub async fn check_service(&mut self) -> Result<()> {
        match self.client.health().await {
            Ok(report) if report.ok => self.feedback.set_indicator(Indicator::Ready)?,
            Ok(_) | Err(_) => {
                warn!(
                    "Prediction service at {} is not healthy",
                    self.config.service.endpoint.base_url
                );
                writeln!(
                    stdout(),
                    "{}",
                    "Warning: prediction service unreachable; requests may fail.".yellow()
                )?;
            }
        }

        Ok(())
    }

    /// One-shot text classification.
    pub async fn run_text(&mut self, message: &str) -> Result<()> {
        let Some(message) = validate_message(message) else {
            self.feedback.render_banner(&ClassificationOutcome::failure(
                "Please enter a message to analyze.",
            ))?;
            return Ok(());
        };

        self.feedback.set_busy(true);
        self.feedback.set_indicator(Indicator::Processing)?;
        self.feedback.status("Analyzing message...")?;

        let outcome = self.client.classify_text(message).await;

        self.feedback.clear_status()?;
        self.feedback.render_banner(&outcome)?;
        self.feedback.set_busy(false);
        self.feedback.set_indicator(Indicator::Ready)?;

        Ok(())
    }

    /// Preview and upload an audio file.
    pub async fn run_audio(&mut self, path: &Path) -> Result<()> {
        let mut audio = match AudioFile::open(path) {
            Ok(audio) => audio,
            Err(e) => {
                self.feedback
                    .render_banner(&ClassificationOutcome::failure(format!(
                        "Please select an audio file to analyze. ({})",
                        e
                    )))?;
                return Ok(());
            }
        };

        // Size shows immediately; duration follows once metadata decodes.
        writeln!(
            stdout(),
            "Selected: {} ({})",
            audio.name,
            audio.preview_label()
        )?;

        match audio.probe_duration() {
            Ok(()) if audio.duration_seconds.is_some() => {
                writeln!(stdout(), "          {}", audio.preview_label())?;
            }
            Ok(()) => {}
            Err(e) => warn!("Could not read duration metadata: {}", e),
        }

        if let Err(e) = audio.validate_for_upload() {
            self.feedback
                .render_banner(&ClassificationOutcome::failure(e.to_string()))?;
            return Ok(());
        }

        self.feedback.set_busy(true);
        self.feedback.set_indicator(Indicator::Processing)?;
        self.feedback
            .status("Transcribing and analyzing audio... This may take 10-30 seconds.")?;

        let bytes = audio.read_bytes()?;
        let outcome = self.client.classify_audio(bytes, &audio.name).await;

        self.feedback.clear_status()?;
        self.feedback.render_banner(&outcome)?;
        if let Some(transcript) = &outcome.transcript {
            self.feedback.render_transcript(transcript)?;
        }
        self.feedback.set_busy(false);
        self.feedback.set_indicator(Indicator::Ready)?;

        Ok(())
    }

    /// As-you-type analysis until Esc.
    pub async fn run_live(&mut self) -> Result<()> {
        let (updates_tx, mut updates_rx) = mpsc::channel(100);
        let classifier: Arc<dyn Classifier> = self.client.clone();
        let mut analyzer = LiveAnalyzer::new(
            classifier,
            Duration::from_millis(self.config.live.debounce_ms),
            updates_tx,
        );

        let mut out = stdout();
        writeln!(out, "Type a message; analysis follows your typing. Esc quits.")?;

        let mut buffer = String::new();
        let mut status = String::new();

        {
            let _guard = RawModeGuard::enable()?;
            let mut events = EventStream::new();

            loop {
                tokio::select! {
                    maybe_event = events.next() => {
                        let Some(event) = maybe_event else { break };
                        let event = event.context("Failed to read terminal event")?;

                        let Event::Key(key) = event else { continue };
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }

                        match key.code {
                            KeyCode::Esc => break,
                            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break,
                            KeyCode::Char(c) => {
                                buffer.push(c);
                                analyzer.input_changed(&buffer);
                            }
                            KeyCode::Backspace => {
                                buffer.pop();
                                analyzer.input_changed(&buffer);
                            }
                            _ => continue,
                        }
                    }
                    Some(update) = updates_rx.recv() => {
                        status = match update {
                            LiveUpdate::Cleared => String::new(),
                            LiveUpdate::Analyzing => "analyzing...".to_string(),
                            LiveUpdate::Result(outcome) => live_line(&outcome),
                        };
                    }
                }

                write!(out, "\r\x1b[2K> {}  {}", buffer, status.as_str().dim())?;
                out.flush()?;
            }
        }

        writeln!(out)?;
        Ok(())
    }

    /// Record from the microphone, then classify the finalized clip.
    pub async fn run_record(&mut self) -> Result<()> {
        let backend = MicrophoneBackend::new(AudioBackendConfig {
            target_sample_rate: self.config.audio.sample_rate,
            target_channels: self.config.audio.channels,
            buffer_duration_ms: self.config.audio.buffer_duration_ms,
        });

        let session_config = SessionConfig {
            sample_rate: self.config.audio.sample_rate,
            channels: self.config.audio.channels,
            buffer_duration_ms: self.config.audio.buffer_duration_ms,
            ..Default::default()
        };

        let mut session = RecordingSession::new(session_config, Box::new(backend));

        let feeds = match session.start().await {
            Ok(feeds) => feeds,
            Err(e) => {
                // Terminal denied state; recording is not retryable
                // without a fresh invocation.
                self.feedback
                    .render_banner(&ClassificationOutcome::failure(format!(
                        "Microphone unavailable: {}",
                        e
                    )))?;
                return Ok(());
            }
        };

        let cancel = Arc::new(AtomicBool::new(false));
        let spectrum = SpectrumAnalyzer::new(self.config.viz.fft_size, self.config.viz.bars);
        let (mut levels_rx, viz_task) = viz::spawn_loop(spectrum, feeds.frames, cancel.clone());
        let mut ticks = feeds.ticks;

        let mut out = stdout();
        writeln!(out, "Recording. Enter stops and analyzes, Esc discards.")?;

        let discard;
        {
            let _guard = RawModeGuard::enable()?;
            let mut events = EventStream::new();
            let mut elapsed = 0u64;
            let mut bars = String::new();

            discard = loop {
                tokio::select! {
                    maybe_event = events.next() => {
                        let Some(event) = maybe_event else { break false };
                        let event = event.context("Failed to read terminal event")?;

                        let Event::Key(key) = event else { continue };
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }

                        match key.code {
                            KeyCode::Enter | KeyCode::Char('s') => break false,
                            KeyCode::Esc => break true,
                            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break true,
                            _ => continue,
                        }
                    }
                    Some(secs) = ticks.recv() => {
                        elapsed = secs;
                    }
                    Some(levels) = levels_rx.recv() => {
                        bars = render_bars(&levels);
                    }
                }

                write!(
                    out,
                    "\r\x1b[2K{} {}  {}",
                    "\u{25cf} REC".red(),
                    format_elapsed(elapsed),
                    bars
                )?;
                out.flush()?;
            };
        }

        writeln!(out)?;

        cancel.store(true, std::sync::atomic::Ordering::SeqCst);
        session.stop().await?;
        let _ = viz_task.await;

        if discard {
            writeln!(out, "Recording discarded.")?;
            return Ok(());
        }

        let Some(clip) = session.take_clip() else {
            self.feedback
                .render_banner(&ClassificationOutcome::failure("No recorded audio to analyze."))?;
            return Ok(());
        };

        writeln!(
            out,
            "Recorded {} ({})",
            file::format_duration(clip.duration_seconds()),
            file::format_size(clip.size_bytes() as u64)
        )?;

        self.feedback.set_busy(true);
        self.feedback.set_indicator(Indicator::Processing)?;
        self.feedback
            .status("Transcribing and analyzing audio... This may take 10-30 seconds.")?;

        let filename = format!("{}.wav", session.id());
        let outcome = self.client.classify_audio(clip.wav_bytes, &filename).await;

        self.feedback.clear_status()?;
        self.feedback.render_banner(&outcome)?;
        if let Some(transcript) = &outcome.transcript {
            self.feedback.render_transcript(transcript)?;
        }
        self.feedback.set_busy(false);
        self.feedback.set_indicator(Indicator::Ready)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_whitespace_messages_are_rejected() {
        assert_eq!(validate_message(""), None);
        assert_eq!(validate_message("   \t\n"), None);
    }

    #[test]
    fn messages_are_trimmed() {
        assert_eq!(validate_message("  hello  "), Some("hello"));
    }
}
