// FFT module - centered short-time Fourier transform
//
// This module frames the normalized signal, applies a periodic Hann window
// and computes the magnitude spectrum of every frame. Frames are centered:
// the signal is conceptually zero-padded by n_fft / 2 on both sides, so frame
// t covers samples [t * hop - n_fft / 2, t * hop + n_fft / 2).

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Magnitude spectrogram: one `n_fft / 2 + 1` bin vector per frame
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    frames: Vec<Vec<f64>>,
    n_fft: usize,
}

impl Spectrogram {
    pub fn n_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn n_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    pub fn n_fft(&self) -> usize {
        self.n_fft
    }

    /// Magnitude frames |X|
    pub fn magnitude(&self) -> &[Vec<f64>] {
        &self.frames
    }

    /// Power frames |X|^2
    pub fn power(&self) -> Vec<Vec<f64>> {
        self.frames
            .iter()
            .map(|frame| frame.iter().map(|&m| m * m).collect())
            .collect()
    }
}

/// Centre frequency of every FFT bin, 0 Hz to Nyquist
pub fn fft_frequencies(sample_rate: u32, n_fft: usize) -> Vec<f64> {
    (0..=n_fft / 2)
        .map(|k| k as f64 * sample_rate as f64 / n_fft as f64)
        .collect()
}

/// Periodic Hann window (the DFT-even form used for spectral analysis)
pub fn hann_window(length: usize) -> Vec<f64> {
    (0..length)
        .map(|i| 0.5 - 0.5 * (2.0 * std::f64::consts::PI * i as f64 / length as f64).cos())
        .collect()
}

/// STFT processor with a pre-planned FFT, shareable across threads
pub struct StftProcessor {
    fft: Arc<dyn Fft<f64>>,
    window: Vec<f64>,
    n_fft: usize,
    hop_length: usize,
}

impl StftProcessor {
    /// Create a new STFT processor
    ///
    /// # Arguments
    /// * `n_fft` - FFT size and window length
    /// * `hop_length` - Samples between frame starts
    pub fn new(n_fft: usize, hop_length: usize) -> Self {
        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(n_fft);

        Self {
            fft,
            window: hann_window(n_fft),
            n_fft,
            hop_length,
        }
    }

    pub fn n_fft(&self) -> usize {
        self.n_fft
    }

    pub fn hop_length(&self) -> usize {
        self.hop_length
    }

    /// Number of centered frames for a signal length
    pub fn frame_count(&self, signal_len: usize) -> usize {
        1 + signal_len / self.hop_length
    }

    /// Compute the magnitude spectrogram of a signal
    pub fn magnitude_spectrogram(&self, signal: &[f32]) -> Spectrogram {
        let n_frames = self.frame_count(signal.len());
        let n_bins = self.n_fft / 2 + 1;
        let half = self.n_fft / 2;

        let mut buffer = vec![Complex::new(0.0, 0.0); self.n_fft];
        let mut scratch = vec![Complex::new(0.0, 0.0); self.fft.get_inplace_scratch_len()];
        let mut frames = Vec::with_capacity(n_frames);

        for t in 0..n_frames {
            let center = t * self.hop_length;
            for (j, slot) in buffer.iter_mut().enumerate() {
                // Position in the unpadded signal; outside it the pad is zero
                let sample = (center + j)
                    .checked_sub(half)
                    .and_then(|idx| signal.get(idx))
                    .map_or(0.0, |&s| s as f64);
                *slot = Complex::new(sample * self.window[j], 0.0);
            }

            self.fft.process_with_scratch(&mut buffer, &mut scratch);

            frames.push(buffer[..n_bins].iter().map(|c| c.norm()).collect());
        }

        Spectrogram {
            frames,
            n_fft: self.n_fft,
        }
    }
}
