use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Frequency-domain analysis of capture frames for the recording
/// visualizer.
///
/// Each call windows the latest `fft_size` samples (Hann), runs a forward
/// FFT, and folds the magnitude bins into `bars` levels normalized to
/// 0..1.
pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    fft_size: usize,
    bars: usize,
}

impl SpectrumAnalyzer {
    pub fn new(fft_size: usize, bars: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);

        let window: Vec<f32> = (0..fft_size)
            .map(|i| {
                0.5 * (1.0
                    - (2.0 * std::f32::consts::PI * i as f32 / (fft_size - 1) as f32).cos())
            })
            .collect();

        Self {
            fft,
            window,
            fft_size,
            bars,
        }
    }

    pub fn bars(&self) -> usize {
        self.bars
    }

    /// Compute bar magnitudes for one capture frame.
    ///
    /// Uses the newest `fft_size` samples; shorter frames are zero-padded.
    pub fn analyze(&self, samples: &[i16]) -> Vec<f32> {
        let mut buffer: Vec<Complex<f32>> = vec![Complex::new(0.0, 0.0); self.fft_size];

        let take = samples.len().min(self.fft_size);
        let offset = samples.len() - take;
        for (i, &sample) in samples[offset..].iter().enumerate() {
            buffer[i] = Complex::new(sample as f32 / 32768.0 * self.window[i], 0.0);
        }

        self.fft.process(&mut buffer);

        // Peak magnitude of a full-scale tone under a Hann window
        let norm = self.fft_size as f32 / 4.0;
        let half = self.fft_size / 2;
        let bins_per_bar = (half / self.bars).max(1);

        (0..self.bars)
            .map(|bar| {
                let start = bar * bins_per_bar;
                let end = (start + bins_per_bar).min(half);
                if start >= end {
                    return 0.0;
                }

                let peak = buffer[start..end]
                    .iter()
                    .map(|c| c.norm())
                    .fold(0.0f32, f32::max);

                (peak / norm).min(1.0)
            })
            .collect()
    }
}

const BAR_GLYPHS: [char; 8] = ['\u{2581}', '\u{2582}', '\u{2583}', '\u{2584}', '\u{2585}', '\u{2586}', '\u{2587}', '\u{2588}'];

/// Render bar levels as a row of block glyphs.
pub fn render_bars(levels: &[f32]) -> String {
    levels
        .iter()
        .map(|&level| {
            if level < 0.005 {
                ' '
            } else {
                let idx = ((level * BAR_GLYPHS.len() as f32).ceil() as usize)
                    .clamp(1, BAR_GLYPHS.len());
                BAR_GLYPHS[idx - 1]
            }
        })
        .collect()
}
