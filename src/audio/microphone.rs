// Microphone backend using cpal
//
// cpal streams are not Send, so the stream lives on a dedicated thread
// and is torn down by flipping a stop flag and joining that thread.

use anyhow::{anyhow, bail, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};

use super::backend::{AudioBackend, AudioBackendConfig, AudioFrame};

pub struct MicrophoneBackend {
    config: AudioBackendConfig,
    stop_flag: Arc<AtomicBool>,
    capture_thread: Option<std::thread::JoinHandle<()>>,
    capturing: bool,
}

impl MicrophoneBackend {
    pub fn new(config: AudioBackendConfig) -> Self {
        Self {
            config,
            stop_flag: Arc::new(AtomicBool::new(false)),
            capture_thread: None,
            capturing: false,
        }
    }
}

#[async_trait::async_trait]
impl AudioBackend for MicrophoneBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        if self.capturing {
            bail!("Already capturing");
        }

        let (frame_tx, frame_rx) = mpsc::channel(100);
        let (ready_tx, ready_rx) = oneshot::channel();

        self.stop_flag = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&self.stop_flag);
        let config = self.config.clone();

        self.capture_thread = Some(std::thread::spawn(move || {
            run_capture(config, frame_tx, stop_flag, ready_tx);
        }));

        // The thread reports whether the device could be opened.
        match ready_rx.await {
            Ok(Ok(())) => {
                self.capturing = true;
                info!("Microphone capture started");
                Ok(frame_rx)
            }
            Ok(Err(e)) => {
                self.capture_thread.take();
                Err(e.context("Failed to acquire microphone"))
            }
            Err(_) => {
                self.capture_thread.take();
                Err(anyhow!("Capture thread exited before reporting readiness"))
            }
        }
    }

    async fn stop(&mut self) -> Result<()> {
        if !self.capturing {
            return Ok(());
        }

        info!("Stopping microphone capture");

        self.stop_flag.store(true, Ordering::SeqCst);

        if let Some(handle) = self.capture_thread.take() {
            let join = tokio::task::spawn_blocking(move || handle.join());
            join.await
                .context("Join task panicked")?
                .map_err(|_| anyhow!("Capture thread panicked"))?;
        }

        self.capturing = false;

        info!("Microphone capture stopped");

        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn name(&self) -> &str {
        "cpal microphone"
    }
}

/// Open the default input device and pump frames until the stop flag flips.
///
/// Runs on a dedicated thread. The stream is dropped (releasing the
/// device) before the thread exits, on both the normal and error paths.
#[allow(deprecated)] // device.name() is deprecated in newer cpal but has no stable replacement yet
fn run_capture(
    config: AudioBackendConfig,
    frame_tx: mpsc::Sender<AudioFrame>,
    stop_flag: Arc<AtomicBool>,
    ready_tx: oneshot::Sender<Result<()>>,
) {
    let stream = (|| -> Result<cpal::Stream> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| anyhow!("No default input device available"))?;

        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());

        let supported_config = device
            .default_input_config()
            .context("No supported input configuration")?;
        let source_rate = supported_config.sample_rate();
        let source_channels = supported_config.channels() as usize;

        info!(
            "Opening input device '{}': {}Hz, {} channels",
            device_name, source_rate, source_channels
        );

        let target_rate = config.target_sample_rate;
        let frame_len =
            (target_rate as u64 * config.buffer_duration_ms / 1000).max(1) as usize;
        let started = Instant::now();
        let mut pending: Vec<i16> = Vec::with_capacity(frame_len * 2);

        let stream = device.build_input_stream(
            &supported_config.into(),
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                pending.extend(downmix_and_decimate(
                    data,
                    source_rate,
                    source_channels,
                    target_rate,
                ));

                while pending.len() >= frame_len {
                    let samples: Vec<i16> = pending.drain(..frame_len).collect();
                    let frame = AudioFrame {
                        samples,
                        sample_rate: target_rate,
                        channels: 1,
                        timestamp_ms: started.elapsed().as_millis() as u64,
                    };
                    // try_send keeps the audio callback non-blocking; a full
                    // channel means the consumer stalled and we shed frames.
                    if frame_tx.try_send(frame).is_err() {
                        warn!("Frame channel full, dropping {} samples", frame_len);
                    }
                }
            },
            |err| {
                error!("Audio stream error: {}", err);
            },
            None,
        )?;

        stream.play().context("Failed to start input stream")?;

        Ok(stream)
    })();

    match stream {
        Ok(stream) => {
            let _ = ready_tx.send(Ok(()));

            while !stop_flag.load(Ordering::SeqCst) {
                std::thread::sleep(std::time::Duration::from_millis(50));
            }

            drop(stream);
        }
        Err(e) => {
            let _ = ready_tx.send(Err(e));
        }
    }
}

/// Downmix to mono and decimate to the target rate, converting to i16
fn downmix_and_decimate(
    samples: &[f32],
    source_rate: u32,
    channels: usize,
    target_rate: u32,
) -> Vec<i16> {
    let ratio = ((source_rate / target_rate.max(1)) as usize).max(1);

    samples
        .chunks(channels.max(1))
        .step_by(ratio)
        .map(|frame| {
            // Average all channels for mono mix
            let mono: f32 = frame.iter().sum::<f32>() / frame.len() as f32;
            (mono * 32767.0).clamp(-32768.0, 32767.0) as i16
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downmix_stereo_to_mono() {
        // Stereo 48kHz -> mono 16kHz (ratio 3)
        let stereo: Vec<f32> = vec![0.5, -0.5, 0.3, -0.3, 0.1, -0.1]; // 3 stereo frames
        let result = downmix_and_decimate(&stereo, 48000, 2, 16000);
        assert_eq!(result.len(), 1);
        // Averaged channels cancel out
        assert_eq!(result[0], 0);
    }

    #[test]
    fn downmix_preserves_values_at_target_rate() {
        let mono = vec![0.5f32, 0.25, 0.0, -0.25, -0.5];
        let result = downmix_and_decimate(&mono, 16000, 1, 16000);
        assert_eq!(result.len(), 5);
        assert_eq!(result[0], (0.5 * 32767.0) as i16);
    }

    #[test]
    fn backend_starts_idle() {
        let backend = MicrophoneBackend::new(AudioBackendConfig::default());
        assert!(!backend.is_capturing());
        assert_eq!(backend.name(), "cpal microphone");
    }
}
