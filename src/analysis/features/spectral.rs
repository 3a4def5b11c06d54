// Spectral module - Frequency-domain feature extraction
//
// This module computes per-frame spectral shape descriptors from magnitude
// spectra: centroid, bandwidth, rolloff and octave-band contrast. Silent
// frames (zero total magnitude) yield 0 Hz for centroid, bandwidth and
// rolloff instead of dividing by zero.
//
// References:
// - Peeters, G. (2004). A large set of audio features for sound description
// - Jiang, D.-N. et al. (2002). Music type classification by spectral contrast feature

use std::ops::Range;

use super::fft::fft_frequencies;
use super::mel::power_to_db;
use super::params::{NORM_THRESHOLD, ROLLOFF_PERCENT};
use super::types::FeatureMatrix;

/// Spectral feature computation functions
pub struct SpectralFeatures {
    freqs: Vec<f64>,
}

impl SpectralFeatures {
    /// Create a new spectral features processor
    ///
    /// # Arguments
    /// * `sample_rate` - Audio sample rate in Hz
    /// * `n_fft` - FFT size the spectra were computed with
    pub fn new(sample_rate: u32, n_fft: usize) -> Self {
        Self {
            freqs: fft_frequencies(sample_rate, n_fft),
        }
    }

    /// Total magnitude, or 1.0 for silent frames so they stay unnormalized
    fn l1_norm(spectrum: &[f64]) -> f64 {
        let total: f64 = spectrum.iter().map(|m| m.abs()).sum();
        if total < NORM_THRESHOLD {
            1.0
        } else {
            total
        }
    }

    /// Compute spectral centroid (weighted mean frequency)
    ///
    /// Formula: centroid = Σ(f_i × |X[i]|) / Σ|X[i]|
    ///
    /// # Returns
    /// Spectral centroid in Hz
    pub fn compute_centroid(&self, spectrum: &[f64]) -> f64 {
        let norm = Self::l1_norm(spectrum);
        self.freqs
            .iter()
            .zip(spectrum)
            .map(|(f, m)| f * m / norm)
            .sum()
    }

    /// Compute spectral bandwidth (second-order spread around the centroid)
    ///
    /// Formula: bandwidth = sqrt(Σ p_i × (f_i - centroid)²), p = |X| / Σ|X|
    pub fn compute_bandwidth(&self, spectrum: &[f64]) -> f64 {
        let norm = Self::l1_norm(spectrum);
        let centroid = self.compute_centroid(spectrum);
        self.freqs
            .iter()
            .zip(spectrum)
            .map(|(f, m)| {
                let deviation = (f - centroid).abs();
                m / norm * deviation * deviation
            })
            .sum::<f64>()
            .sqrt()
    }

    /// Compute spectral rolloff (ROLLOFF_PERCENT cumulative magnitude)
    ///
    /// Returns the lowest bin frequency at which the cumulative magnitude
    /// reaches `ROLLOFF_PERCENT` of the frame total.
    pub fn compute_rolloff(&self, spectrum: &[f64]) -> f64 {
        let total: f64 = spectrum.iter().sum();
        let threshold = ROLLOFF_PERCENT * total;

        let mut cumulative = 0.0;
        for (i, &mag) in spectrum.iter().enumerate() {
            cumulative += mag;
            if cumulative >= threshold {
                return self.freqs[i];
            }
        }

        // Rounding left the running sum just short of the threshold
        self.freqs[spectrum.len() - 1]
    }

    pub fn centroid(&self, frames: &[Vec<f64>]) -> FeatureMatrix {
        FeatureMatrix::from_row(frames.iter().map(|s| self.compute_centroid(s)).collect())
    }

    pub fn bandwidth(&self, frames: &[Vec<f64>]) -> FeatureMatrix {
        FeatureMatrix::from_row(frames.iter().map(|s| self.compute_bandwidth(s)).collect())
    }

    pub fn rolloff(&self, frames: &[Vec<f64>]) -> FeatureMatrix {
        FeatureMatrix::from_row(frames.iter().map(|s| self.compute_rolloff(s)).collect())
    }
}

/// Why a contrast band layout cannot be built
#[derive(Debug, Clone, PartialEq)]
pub enum ContrastLayoutError {
    /// A band edge sits at or above Nyquist
    AboveNyquist { edge_hz: f64, nyquist_hz: f64 },
    /// No FFT bin falls inside a band
    EmptyBand { band: usize },
}

impl std::fmt::Display for ContrastLayoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContrastLayoutError::AboveNyquist {
                edge_hz,
                nyquist_hz,
            } => write!(
                f,
                "band edge {:.1} Hz is not below Nyquist ({:.1} Hz)",
                edge_hz, nyquist_hz
            ),
            ContrastLayoutError::EmptyBand { band } => {
                write!(f, "sub-band {} contains no FFT bins", band)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ContrastBand {
    /// Bins whose sorted magnitudes are averaged
    bins: Range<usize>,
    /// Number of lowest/highest sorted bins averaged for valley/peak
    quantile_count: usize,
}

/// Octave-band layout for spectral contrast
///
/// Band 0 spans 0..fmin, band k spans fmin·2^(k-1)..fmin·2^k, each extended
/// one bin downwards; the last band also takes every bin up to Nyquist.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralContrast {
    bands: Vec<ContrastBand>,
}

impl SpectralContrast {
    pub fn new(
        sample_rate: u32,
        n_fft: usize,
        n_bands: usize,
        fmin: f64,
        quantile: f64,
    ) -> Result<Self, ContrastLayoutError> {
        let freqs = fft_frequencies(sample_rate, n_fft);
        let nyquist = 0.5 * sample_rate as f64;

        let mut edges = vec![0.0; n_bands + 2];
        for (k, edge) in edges.iter_mut().enumerate().skip(1) {
            *edge = fmin * 2.0_f64.powi(k as i32 - 1);
        }
        if let Some(&edge_hz) = edges[..n_bands + 1].iter().find(|&&e| e >= nyquist) {
            return Err(ContrastLayoutError::AboveNyquist {
                edge_hz,
                nyquist_hz: nyquist,
            });
        }

        let mut bands = Vec::with_capacity(n_bands + 1);
        for k in 0..=n_bands {
            let (low, high) = (edges[k], edges[k + 1]);
            let first = freqs.iter().position(|&f| f >= low && f <= high);
            let last = freqs.iter().rposition(|&f| f >= low && f <= high);
            let (mut first, mut last) = match (first, last) {
                (Some(a), Some(b)) => (a, b),
                _ => return Err(ContrastLayoutError::EmptyBand { band: k }),
            };

            if k > 0 {
                first = first.saturating_sub(1);
            }
            if k == n_bands {
                last = freqs.len() - 1;
            }

            let selected = last - first + 1;
            let quantile_count = ((quantile * selected as f64).round_ties_even() as usize).max(1);

            // All bands but the last leave out their top bin
            let end = if k < n_bands { last } else { last + 1 };
            if end <= first {
                return Err(ContrastLayoutError::EmptyBand { band: k });
            }

            bands.push(ContrastBand {
                bins: first..end,
                quantile_count,
            });
        }

        Ok(Self { bands })
    }

    pub fn n_rows(&self) -> usize {
        self.bands.len()
    }

    /// Peak-minus-valley contrast in dB: `(n_bands + 1) × n_frames`
    pub fn compute(&self, frames: &[Vec<f64>]) -> FeatureMatrix {
        let mut peaks = FeatureMatrix::zeros(self.bands.len(), frames.len());
        let mut valleys = FeatureMatrix::zeros(self.bands.len(), frames.len());
        let mut sorted = Vec::new();

        for (t, frame) in frames.iter().enumerate() {
            for (k, band) in self.bands.iter().enumerate() {
                sorted.clear();
                sorted.extend_from_slice(&frame[band.bins.clone()]);
                sorted.sort_by(|a, b| a.total_cmp(b));

                let q = band.quantile_count.min(sorted.len());
                let valley = sorted[..q].iter().sum::<f64>() / q as f64;
                let peak = sorted[sorted.len() - q..].iter().sum::<f64>() / q as f64;
                valleys.set(k, t, valley);
                peaks.set(k, t, peak);
            }
        }

        let peak_db = power_to_db(&peaks);
        let valley_db = power_to_db(&valleys);
        let mut contrast = peak_db;
        for (c, v) in contrast.values_mut().iter_mut().zip(valley_db.values()) {
            *c -= v;
        }
        contrast
    }
}
