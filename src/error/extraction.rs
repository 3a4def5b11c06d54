// Feature extraction error types and constants

use crate::analysis::features::params::MAX_SAMPLE_RATE;
use crate::analysis::features::Transform;
use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Extraction error code constants
///
/// Error code range: 2001-2006
pub struct ExtractionErrorCodes {}

impl ExtractionErrorCodes {
    /// Waveform has zero samples
    pub const EMPTY_WAVEFORM: i32 = 2001;

    /// Waveform contains NaN or infinite samples
    pub const NON_FINITE_SAMPLE: i32 = 2002;

    /// Sample rate is zero
    pub const INVALID_SAMPLE_RATE: i32 = 2003;

    /// Sample rate above the supported maximum
    pub const WAVEFORM_TOO_LONG: i32 = 2004;

    /// A transform could not be computed for this input
    pub const TRANSFORM_FAILED: i32 = 2005;

    /// An aggregate came out NaN or infinite
    pub const NON_FINITE_FEATURE: i32 = 2006;
}

/// Coarse classification of extraction failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionErrorKind {
    /// The caller handed over a waveform that violates the input contract
    MalformedInput,
    /// The input was valid but the analysis produced undefined numbers
    NumericDegeneracy,
}

/// Log an extraction error with structured context
pub fn log_extraction_error(err: &ExtractionError, context: &str) {
    error!(
        "Extraction error in {}: code={}, component=FeatureExtractor, kind={:?}, message={}",
        context,
        err.code(),
        err.kind(),
        err.message()
    );
}

/// Errors raised by the waveform normalizer and the feature extractor
///
/// Error code ranges: 2001-2006
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// Waveform has zero samples
    EmptyWaveform,

    /// Waveform contains NaN or infinite samples
    NonFiniteSample { index: usize },

    /// Sample rate is zero
    InvalidSampleRate { sample_rate: u32 },

    /// Sample rate is above `MAX_SAMPLE_RATE`, so the normalized clip would be too long
    WaveformTooLong { sample_rate: u32 },

    /// A transform could not be computed for this input
    TransformFailed { transform: Transform, reason: String },

    /// An aggregate came out NaN or infinite
    NonFiniteFeature { feature: &'static str },
}

impl ExtractionError {
    pub fn kind(&self) -> ExtractionErrorKind {
        match self {
            ExtractionError::EmptyWaveform
            | ExtractionError::NonFiniteSample { .. }
            | ExtractionError::InvalidSampleRate { .. }
            | ExtractionError::WaveformTooLong { .. } => ExtractionErrorKind::MalformedInput,
            ExtractionError::TransformFailed { .. } | ExtractionError::NonFiniteFeature { .. } => {
                ExtractionErrorKind::NumericDegeneracy
            }
        }
    }

    pub fn is_malformed_input(&self) -> bool {
        self.kind() == ExtractionErrorKind::MalformedInput
    }
}

impl ErrorCode for ExtractionError {
    fn code(&self) -> i32 {
        match self {
            ExtractionError::EmptyWaveform => ExtractionErrorCodes::EMPTY_WAVEFORM,
            ExtractionError::NonFiniteSample { .. } => ExtractionErrorCodes::NON_FINITE_SAMPLE,
            ExtractionError::InvalidSampleRate { .. } => ExtractionErrorCodes::INVALID_SAMPLE_RATE,
            ExtractionError::WaveformTooLong { .. } => ExtractionErrorCodes::WAVEFORM_TOO_LONG,
            ExtractionError::TransformFailed { .. } => ExtractionErrorCodes::TRANSFORM_FAILED,
            ExtractionError::NonFiniteFeature { .. } => ExtractionErrorCodes::NON_FINITE_FEATURE,
        }
    }

    fn message(&self) -> String {
        match self {
            ExtractionError::EmptyWaveform => "Waveform contains no samples".to_string(),
            ExtractionError::NonFiniteSample { index } => {
                format!("Waveform sample {} is not a finite number", index)
            }
            ExtractionError::InvalidSampleRate { sample_rate } => {
                format!("Sample rate must be greater than 0 (got {})", sample_rate)
            }
            ExtractionError::WaveformTooLong { sample_rate } => {
                format!(
                    "Sample rate {} Hz exceeds the supported maximum of {} Hz",
                    sample_rate, MAX_SAMPLE_RATE
                )
            }
            ExtractionError::TransformFailed { transform, reason } => {
                format!("{} failed: {}", transform.key(), reason)
            }
            ExtractionError::NonFiniteFeature { feature } => {
                format!("Feature {} is not a finite number", feature)
            }
        }
    }
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ExtractionError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for ExtractionError {}
