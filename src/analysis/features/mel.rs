// Mel module - mel spectrogram, dB scaling and MFCC
//
// The mel filterbank uses the Slaney mel scale (linear below 1 kHz,
// logarithmic above) with Slaney area normalization, spanning 0 Hz to Nyquist.
// MFCCs are the orthonormal DCT-II of the dB-scaled mel spectrogram.
//
// References:
// - Slaney, M. (1998). Auditory Toolbox, Technical Report #1998-010
// - Davis, S. & Mermelstein, P. (1980). Comparison of parametric
//   representations for monosyllabic word recognition

use super::fft::fft_frequencies;
use super::params::{DB_AMIN, DB_TOP_DB};
use super::types::FeatureMatrix;

const F_SP: f64 = 200.0 / 3.0;
const MIN_LOG_HZ: f64 = 1000.0;
const MIN_LOG_MEL: f64 = MIN_LOG_HZ / F_SP;

fn log_step() -> f64 {
    6.4_f64.ln() / 27.0
}

/// Convert frequency in Hz to the Slaney mel scale
pub fn hz_to_mel(hz: f64) -> f64 {
    if hz < MIN_LOG_HZ {
        hz / F_SP
    } else {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step()
    }
}

/// Convert a Slaney mel value back to Hz
pub fn mel_to_hz(mel: f64) -> f64 {
    if mel < MIN_LOG_MEL {
        mel * F_SP
    } else {
        MIN_LOG_HZ * ((mel - MIN_LOG_MEL) * log_step()).exp()
    }
}

/// Triangular filter stored as its non-zero span
#[derive(Debug, Clone)]
struct MelFilter {
    start: usize,
    weights: Vec<f64>,
}

/// Precomputed mel filterbank for one sample rate / FFT size
#[derive(Debug, Clone)]
pub struct MelFilterbank {
    filters: Vec<MelFilter>,
}

impl MelFilterbank {
    /// Build `n_mels` Slaney-normalized triangular filters from `fmin` to `fmax`
    pub fn new(sample_rate: u32, n_fft: usize, n_mels: usize, fmin: f64, fmax: f64) -> Self {
        let fft_freqs = fft_frequencies(sample_rate, n_fft);

        let mel_min = hz_to_mel(fmin);
        let mel_max = hz_to_mel(fmax);
        let edges: Vec<f64> = (0..n_mels + 2)
            .map(|i| mel_to_hz(mel_min + (mel_max - mel_min) * i as f64 / (n_mels + 1) as f64))
            .collect();

        let filters = (0..n_mels)
            .map(|m| {
                let (lower, center, upper) = (edges[m], edges[m + 1], edges[m + 2]);
                let enorm = 2.0 / (upper - lower);
                let dense: Vec<f64> = fft_freqs
                    .iter()
                    .map(|&f| {
                        let rising = (f - lower) / (center - lower);
                        let falling = (upper - f) / (upper - center);
                        rising.min(falling).max(0.0) * enorm
                    })
                    .collect();

                let start = dense.iter().position(|&w| w > 0.0).unwrap_or(0);
                let end = dense
                    .iter()
                    .rposition(|&w| w > 0.0)
                    .map_or(start, |i| i + 1);
                MelFilter {
                    start,
                    weights: dense[start..end].to_vec(),
                }
            })
            .collect();

        Self { filters }
    }

    pub fn n_mels(&self) -> usize {
        self.filters.len()
    }

    /// Project power frames onto the mel bands: `n_mels × n_frames`
    pub fn apply(&self, power_frames: &[Vec<f64>]) -> FeatureMatrix {
        let mut mel = FeatureMatrix::zeros(self.filters.len(), power_frames.len());
        for (t, frame) in power_frames.iter().enumerate() {
            for (m, filter) in self.filters.iter().enumerate() {
                let energy: f64 = filter
                    .weights
                    .iter()
                    .zip(&frame[filter.start..filter.start + filter.weights.len()])
                    .map(|(w, p)| w * p)
                    .sum();
                mel.set(m, t, energy);
            }
        }
        mel
    }

    #[cfg(test)]
    fn dense_row(&self, m: usize, n_bins: usize) -> Vec<f64> {
        let mut row = vec![0.0; n_bins];
        let filter = &self.filters[m];
        row[filter.start..filter.start + filter.weights.len()].copy_from_slice(&filter.weights);
        row
    }
}

/// Convert a power matrix to decibels (ref 1.0), clipped `DB_TOP_DB` below its peak
pub fn power_to_db(power: &FeatureMatrix) -> FeatureMatrix {
    let mut db = power.clone();
    let mut peak = f64::NEG_INFINITY;
    for v in db.values_mut() {
        *v = 10.0 * v.max(DB_AMIN).log10();
        peak = peak.max(*v);
    }

    let floor = peak - DB_TOP_DB;
    for v in db.values_mut() {
        *v = v.max(floor);
    }
    db
}

/// Orthonormal DCT-II basis, `n_out` rows of length `n_in`
fn dct_basis(n_out: usize, n_in: usize) -> Vec<Vec<f64>> {
    let n = n_in as f64;
    (0..n_out)
        .map(|k| {
            let scale = if k == 0 {
                (1.0 / n).sqrt()
            } else {
                (2.0 / n).sqrt()
            };
            (0..n_in)
                .map(|i| {
                    scale
                        * (std::f64::consts::PI * k as f64 * (2.0 * i as f64 + 1.0) / (2.0 * n))
                            .cos()
                })
                .collect()
        })
        .collect()
}

/// MFCCs from a (linear power) mel spectrogram: `n_mfcc × n_frames`
pub fn mfcc(mel_power: &FeatureMatrix, n_mfcc: usize) -> FeatureMatrix {
    let db = power_to_db(mel_power);
    let n_mels = db.n_bands();
    let basis = dct_basis(n_mfcc, n_mels);

    let mut out = FeatureMatrix::zeros(n_mfcc, db.n_frames());
    for t in 0..db.n_frames() {
        for (k, row) in basis.iter().enumerate() {
            let coeff: f64 = row.iter().enumerate().map(|(m, b)| b * db.get(m, t)).sum();
            out.set(k, t, coeff);
        }
    }
    out
}
