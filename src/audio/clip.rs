use anyhow::{Context, Result};
use std::io::Cursor;
use tokio::sync::mpsc;
use tracing::info;

use super::backend::AudioFrame;

/// A finalized recording, encoded as WAV and held in memory.
///
/// Created exactly once per recording session, on the transition to
/// `Stopped`; this is the only view of the capture later stages may read.
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub wav_bytes: Vec<u8>,
    pub sample_rate: u32,
    pub channels: u16,
    pub sample_count: usize,
}

impl AudioClip {
    pub fn duration_seconds(&self) -> f64 {
        self.sample_count as f64 / (self.sample_rate as f64 * self.channels as f64)
    }

    pub fn size_bytes(&self) -> usize {
        self.wav_bytes.len()
    }
}

/// Accumulates capture frames in arrival order and finalizes them into a
/// single in-memory WAV clip.
pub struct ClipRecorder {
    sample_rate: u32,
    channels: u16,
    samples: Vec<i16>,
    frames_received: usize,
}

impl ClipRecorder {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
            samples: Vec::new(),
            frames_received: 0,
        }
    }

    pub fn push_frame(&mut self, frame: &AudioFrame) {
        self.samples.extend_from_slice(&frame.samples);
        self.frames_received += 1;
    }

    pub fn frames_received(&self) -> usize {
        self.frames_received
    }

    /// Drain a frame channel until it closes, then finalize.
    pub async fn record(mut self, mut audio_rx: mpsc::Receiver<AudioFrame>) -> Result<AudioClip> {
        while let Some(frame) = audio_rx.recv().await {
            self.push_frame(&frame);
        }

        self.finalize()
    }

    /// Encode the accumulated samples as a WAV clip.
    pub fn finalize(self) -> Result<AudioClip> {
        let spec = hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)
                .context("Failed to create WAV encoder")?;

            for &sample in &self.samples {
                writer
                    .write_sample(sample)
                    .context("Failed to encode sample")?;
            }

            writer.finalize().context("Failed to finalize WAV clip")?;
        }

        let clip = AudioClip {
            wav_bytes: cursor.into_inner(),
            sample_rate: self.sample_rate,
            channels: self.channels,
            sample_count: self.samples.len(),
        };

        info!(
            "Finalized clip: {:.1}s, {} samples, {} bytes",
            clip.duration_seconds(),
            clip.sample_count,
            clip.size_bytes()
        );

        Ok(clip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(samples: Vec<i16>, timestamp_ms: u64) -> AudioFrame {
        AudioFrame {
            samples,
            sample_rate: 16000,
            channels: 1,
            timestamp_ms,
        }
    }

    #[test]
    fn finalize_concatenates_frames_in_order() {
        let mut recorder = ClipRecorder::new(16000, 1);
        recorder.push_frame(&frame(vec![1, 2, 3], 0));
        recorder.push_frame(&frame(vec![4, 5], 100));
        recorder.push_frame(&frame(vec![6], 200));

        let clip = recorder.finalize().unwrap();
        assert_eq!(clip.sample_count, 6);

        let reader = hound::WavReader::new(Cursor::new(clip.wav_bytes)).unwrap();
        let decoded: Vec<i16> = reader.into_samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn empty_recording_is_a_valid_clip() {
        let clip = ClipRecorder::new(16000, 1).finalize().unwrap();
        assert_eq!(clip.sample_count, 0);
        assert_eq!(clip.duration_seconds(), 0.0);
        // Header-only WAV still decodes
        assert!(hound::WavReader::new(Cursor::new(clip.wav_bytes)).is_ok());
    }

    #[test]
    fn duration_reflects_sample_rate() {
        let mut recorder = ClipRecorder::new(16000, 1);
        recorder.push_frame(&frame(vec![0i16; 16000], 0));
        let clip = recorder.finalize().unwrap();
        assert_eq!(clip.duration_seconds(), 1.0);
    }
}
