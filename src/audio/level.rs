use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/// Analysis window length, in samples.
const FFT_SIZE: usize = 256;

/// Maps the average spectrum magnitude into the visible display range.
/// Speech energy spreads across many bins, so the raw average sits well
/// below full scale without this.
const LEVEL_GAIN: f32 = 4.0;

/// Frequency-domain input level meter.
///
/// Capture callbacks feed the most recent samples in; `level` runs a
/// forward FFT over the window and maps the average bin magnitude to a
/// 0-100 scale, clamped.
pub struct LevelMeter {
    fft: Arc<dyn Fft<f32>>,
    window: Mutex<VecDeque<f32>>,
}

impl LevelMeter {
    pub fn new() -> Self {
        let mut planner = FftPlanner::new();
        Self {
            fft: planner.plan_fft_forward(FFT_SIZE),
            window: Mutex::new(VecDeque::with_capacity(FFT_SIZE)),
        }
    }

    /// Feeds freshly captured mono samples, normalized to [-1, 1].
    pub fn push(&self, samples: &[f32]) {
        let Ok(mut window) = self.window.lock() else {
            return;
        };
        for &sample in samples {
            if window.len() == FFT_SIZE {
                window.pop_front();
            }
            window.push_back(sample);
        }
    }

    /// Feeds freshly captured mono PCM samples.
    pub fn push_i16(&self, samples: &[i16]) {
        let Ok(mut window) = self.window.lock() else {
            return;
        };
        for &sample in samples {
            if window.len() == FFT_SIZE {
                window.pop_front();
            }
            window.push_back(sample as f32 / i16::MAX as f32);
        }
    }

    /// Instantaneous input level in [0, 100].
    pub fn level(&self) -> f32 {
        let mut buffer: Vec<Complex<f32>> = {
            let Ok(window) = self.window.lock() else {
                return 0.0;
            };
            window.iter().map(|&s| Complex::new(s, 0.0)).collect()
        };
        if buffer.is_empty() {
            return 0.0;
        }
        buffer.resize(FFT_SIZE, Complex::new(0.0, 0.0));

        self.fft.process(&mut buffer);

        // Average magnitude over the first half of the spectrum, DC skipped.
        // A full-scale sine concentrates FFT_SIZE/2 in one bin, which
        // averages out to ~1.0 across the half-spectrum.
        let bins = FFT_SIZE / 2;
        let sum: f32 = buffer[1..bins].iter().map(|c| c.norm()).sum();
        let mean = sum / (bins - 1) as f32;

        (mean * LEVEL_GAIN * 100.0).clamp(0.0, 100.0)
    }
}

impl Default for LevelMeter {
    fn default() -> Self {
        Self::new()
    }
}
