// Waveform - validated mono audio clip
//
// A Waveform is the input boundary of the feature pipeline: a complete,
// finite clip of mono samples at its native sample rate. Construction
// validates the clip so downstream stages never see NaN/Inf samples,
// an empty buffer or a sample rate outside 1..=MAX_SAMPLE_RATE.

use crate::analysis::features::params::MAX_SAMPLE_RATE;
use crate::error::ExtractionError;

/// Mono audio clip at its native sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl Waveform {
    /// Validate and wrap a decoded clip
    ///
    /// # Errors
    /// * `EmptyWaveform` - no samples
    /// * `NonFiniteSample` - the first NaN/Inf sample, by index
    /// * `InvalidSampleRate` - sample rate of zero
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self, ExtractionError> {
        validate(&samples, sample_rate)?;
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false for a constructed waveform; kept for API symmetry
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Clip duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }
}

/// Check the input contract shared by `Waveform::new` and `normalize`
pub(crate) fn validate(samples: &[f32], sample_rate: u32) -> Result<(), ExtractionError> {
    if sample_rate == 0 {
        return Err(ExtractionError::InvalidSampleRate { sample_rate });
    }
    if sample_rate > MAX_SAMPLE_RATE {
        return Err(ExtractionError::WaveformTooLong { sample_rate });
    }

    if samples.is_empty() {
        return Err(ExtractionError::EmptyWaveform);
    }

    if let Some(index) = samples.iter().position(|s| !s.is_finite()) {
        return Err(ExtractionError::NonFiniteSample { index });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_waveform() {
        let waveform = Waveform::new(vec![0.0, 0.5, -0.5, 0.25], 8000).unwrap();
        assert_eq!(waveform.len(), 4);
        assert_eq!(waveform.sample_rate(), 8000);
        assert!((waveform.duration_secs() - 0.0005).abs() < 1e-12);
    }

    #[test]
    fn test_empty_waveform_rejected() {
        assert_eq!(
            Waveform::new(Vec::new(), 22050),
            Err(ExtractionError::EmptyWaveform)
        );
    }

    #[test]
    fn test_zero_sample_rate_rejected() {
        assert_eq!(
            Waveform::new(vec![0.1], 0),
            Err(ExtractionError::InvalidSampleRate { sample_rate: 0 })
        );
    }

    #[test]
    fn test_sample_rate_above_maximum_rejected() {
        assert!(Waveform::new(vec![0.1], MAX_SAMPLE_RATE).is_ok());

        let err = Waveform::new(vec![0.1; 4], 400_000_000).unwrap_err();
        assert_eq!(
            err,
            ExtractionError::WaveformTooLong {
                sample_rate: 400_000_000
            }
        );
        assert!(err.is_malformed_input());
    }

    #[test]
    fn test_non_finite_sample_reports_first_index() {
        let err = Waveform::new(vec![0.0, 0.2, f32::NAN, f32::INFINITY], 16000).unwrap_err();
        assert_eq!(err, ExtractionError::NonFiniteSample { index: 2 });
        assert!(err.is_malformed_input());
    }
}
