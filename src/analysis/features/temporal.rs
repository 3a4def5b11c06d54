// Temporal module - Time-domain feature extraction
//
// This module computes the framed zero-crossing rate directly from the
// time-domain signal. Frames are centered like the STFT frames, but the
// signal is padded by repeating its edge samples rather than with zeros,
// so padding never introduces crossings of its own.
//
// References:
// - Peeters, G. (2004). A large set of audio features for sound description
// - Lerch, A. (2012). An Introduction to Audio Content Analysis

use super::params::ZCR_ZERO_THRESHOLD;
use super::types::FeatureMatrix;

/// Temporal feature computation functions
pub struct TemporalFeatures {
    frame_length: usize,
    hop_length: usize,
}

impl TemporalFeatures {
    /// Create a new temporal features processor
    ///
    /// # Arguments
    /// * `frame_length` - Samples per analysis frame
    /// * `hop_length` - Samples between frame starts
    pub fn new(frame_length: usize, hop_length: usize) -> Self {
        Self {
            frame_length,
            hop_length,
        }
    }

    pub fn frame_count(&self, signal_len: usize) -> usize {
        1 + signal_len / self.hop_length
    }

    /// Sign bit after snapping near-zero samples to +0
    fn is_negative(sample: f32) -> bool {
        (sample.abs() as f64) > ZCR_ZERO_THRESHOLD && sample < 0.0
    }

    /// Compute the framed zero-crossing rate (ZCR)
    ///
    /// Formula: ZCR[t] = (1 / N) × #{n in frame t, n > 0 : sign(x[n]) ≠ sign(x[n-1])}
    ///
    /// Samples with |x| ≤ 1e-10 count as zero, and zero counts as positive.
    /// The first sample of a frame never counts as a crossing.
    ///
    /// # Returns
    /// `1 × n_frames` matrix of rates in [0, 1)
    pub fn zero_crossing_rate(&self, audio: &[f32]) -> FeatureMatrix {
        let n_frames = self.frame_count(audio.len());
        if audio.is_empty() {
            return FeatureMatrix::zeros(1, n_frames);
        }

        let half = self.frame_length / 2;
        let last = audio.len() - 1;
        let padded_len = audio.len() + 2 * half;
        let sign_at = |i: usize| Self::is_negative(audio[i.saturating_sub(half).min(last)]);

        // prefix[i] = crossings between padded positions 1..i (exclusive end)
        let mut prefix = Vec::with_capacity(padded_len + 1);
        prefix.push(0u32);
        prefix.push(0u32);
        let mut prev = sign_at(0);
        for i in 1..padded_len {
            let cur = sign_at(i);
            let crossed = u32::from(cur != prev);
            prefix.push(prefix[i] + crossed);
            prev = cur;
        }

        let rates = (0..n_frames)
            .map(|t| {
                let start = t * self.hop_length;
                let end = (start + self.frame_length).min(padded_len);
                let crossings = prefix[end] - prefix[start + 1];
                crossings as f64 / self.frame_length as f64
            })
            .collect();

        FeatureMatrix::from_row(rates)
    }
}
