// Normalizer - fixed-duration padding/truncation
//
// Every clip is brought to exactly TARGET_DURATION_SECS seconds at its native
// sample rate before analysis. Short clips are zero-padded at the end, long
// clips keep only their first TARGET_DURATION_SECS seconds. No resampling.

use super::waveform::{validate, Waveform};
use crate::analysis::features::params::MAX_SAMPLE_RATE;
use crate::error::ExtractionError;

/// Duration every clip is padded or truncated to
pub const TARGET_DURATION_SECS: u32 = 10;

/// Waveform whose length is exactly `sample_rate * TARGET_DURATION_SECS`
///
/// Only constructible through [`normalize`], so holding one proves the
/// input contract was checked.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedWaveform {
    samples: Vec<f32>,
    sample_rate: u32,
    source_len: usize,
}

impl NormalizedWaveform {
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample count of the clip before normalization
    pub fn source_len(&self) -> usize {
        self.source_len
    }

    /// Number of trailing zeros appended
    pub fn padded_samples(&self) -> usize {
        self.samples.len().saturating_sub(self.source_len)
    }

    /// Number of trailing samples dropped
    pub fn truncated_samples(&self) -> usize {
        self.source_len.saturating_sub(self.samples.len())
    }
}

/// Target sample count for a sample rate
pub fn target_length(sample_rate: u32) -> Result<usize, ExtractionError> {
    if sample_rate == 0 {
        return Err(ExtractionError::InvalidSampleRate { sample_rate });
    }
    if sample_rate > MAX_SAMPLE_RATE {
        return Err(ExtractionError::WaveformTooLong { sample_rate });
    }
    (sample_rate as usize)
        .checked_mul(TARGET_DURATION_SECS as usize)
        .ok_or(ExtractionError::WaveformTooLong { sample_rate })
}

/// Pad or truncate a clip to the fixed analysis duration
///
/// # Errors
/// Returns a malformed-input error for empty clips, non-finite samples or a
/// sample rate of zero or above `MAX_SAMPLE_RATE`. Nothing is allocated
/// before these checks pass.
pub fn normalize(samples: &[f32], sample_rate: u32) -> Result<NormalizedWaveform, ExtractionError> {
    validate(samples, sample_rate)?;
    let target = target_length(sample_rate)?;

    let mut normalized = Vec::with_capacity(target);
    if samples.len() < target {
        normalized.extend_from_slice(samples);
        normalized.resize(target, 0.0);
    } else {
        normalized.extend_from_slice(&samples[..target]);
    }

    Ok(NormalizedWaveform {
        samples: normalized,
        sample_rate,
        source_len: samples.len(),
    })
}

impl Waveform {
    /// Normalize this clip to the fixed analysis duration
    pub fn normalize(&self) -> Result<NormalizedWaveform, ExtractionError> {
        normalize(self.samples(), self.sample_rate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_length_unchanged() {
        let samples: Vec<f32> = (0..80).map(|i| i as f32 / 80.0).collect();
        let normalized = normalize(&samples, 8).unwrap();
        assert_eq!(normalized.samples(), samples.as_slice());
        assert_eq!(normalized.padded_samples(), 0);
        assert_eq!(normalized.truncated_samples(), 0);
    }

    #[test]
    fn test_short_clip_zero_padded_at_end() {
        let samples = vec![0.5_f32; 30];
        let normalized = normalize(&samples, 8).unwrap();
        assert_eq!(normalized.len(), 80);
        assert_eq!(&normalized.samples()[..30], samples.as_slice());
        assert!(normalized.samples()[30..].iter().all(|&s| s == 0.0));
        assert_eq!(normalized.padded_samples(), 50);
    }

    #[test]
    fn test_long_clip_keeps_prefix() {
        let samples: Vec<f32> = (0..150).map(|i| i as f32).collect();
        let normalized = normalize(&samples, 8).unwrap();
        assert_eq!(normalized.len(), 80);
        assert_eq!(normalized.samples(), &samples[..80]);
        assert_eq!(normalized.truncated_samples(), 70);
        assert_eq!(normalized.source_len(), 150);
    }

    #[test]
    fn test_empty_clip_is_malformed() {
        let err = normalize(&[], 22050).unwrap_err();
        assert_eq!(err, ExtractionError::EmptyWaveform);
    }

    #[test]
    fn test_zero_sample_rate_is_malformed() {
        let err = normalize(&[0.1, 0.2], 0).unwrap_err();
        assert_eq!(err, ExtractionError::InvalidSampleRate { sample_rate: 0 });
    }

    #[test]
    fn test_target_length() {
        assert_eq!(target_length(22050).unwrap(), 220_500);
        assert_eq!(target_length(44100).unwrap(), 441_000);
        assert_eq!(target_length(MAX_SAMPLE_RATE).unwrap(), 3_840_000);
        assert_eq!(
            target_length(MAX_SAMPLE_RATE + 1),
            Err(ExtractionError::WaveformTooLong {
                sample_rate: MAX_SAMPLE_RATE + 1
            })
        );
    }

    #[test]
    fn test_huge_header_sample_rate_is_malformed() {
        let err = normalize(&[0.0, 0.1, 0.2, 0.3], 400_000_000).unwrap_err();
        assert_eq!(
            err,
            ExtractionError::WaveformTooLong {
                sample_rate: 400_000_000
            }
        );
        assert!(err.is_malformed_input());
    }

    #[test]
    fn test_waveform_normalize_delegates() {
        let waveform = Waveform::new(vec![0.25; 12], 2).unwrap();
        let normalized = waveform.normalize().unwrap();
        assert_eq!(normalized.len(), 20);
        assert_eq!(normalized.sample_rate(), 2);
    }
}
