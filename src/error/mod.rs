// Error types for the respiratory classifier
//
// This module defines custom error types for audio decoding, feature extraction
// and model loading, providing structured error handling with numeric codes
// suitable for HTTP and CLI reporting.

mod audio;
mod extraction;
mod model;

pub use audio::{log_audio_error, AudioError, AudioErrorCodes};
pub use extraction::{
    log_extraction_error, ExtractionError, ExtractionErrorCodes, ExtractionErrorKind,
};
pub use model::{log_model_error, ModelError, ModelErrorCodes};

use std::fmt;

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the HTTP and CLI boundaries.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}

/// Failure of one classification request, tagged by pipeline stage
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceError {
    /// The uploaded bytes could not be decoded into samples
    Audio(AudioError),
    /// Normalization or feature extraction rejected the waveform
    Extraction(ExtractionError),
    /// The classifier could not be loaded or applied
    Model(ModelError),
}

impl InferenceError {
    /// Pipeline stage that failed, for logs and error payloads
    pub fn stage(&self) -> &'static str {
        match self {
            InferenceError::Audio(_) => "decode",
            InferenceError::Extraction(_) => "extraction",
            InferenceError::Model(_) => "model",
        }
    }
}

impl ErrorCode for InferenceError {
    fn code(&self) -> i32 {
        match self {
            InferenceError::Audio(err) => err.code(),
            InferenceError::Extraction(err) => err.code(),
            InferenceError::Model(err) => err.code(),
        }
    }

    fn message(&self) -> String {
        match self {
            InferenceError::Audio(err) => err.message(),
            InferenceError::Extraction(err) => err.message(),
            InferenceError::Model(err) => err.message(),
        }
    }
}

impl fmt::Display for InferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InferenceError::Audio(err) => write!(f, "{}", err),
            InferenceError::Extraction(err) => write!(f, "{}", err),
            InferenceError::Model(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for InferenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InferenceError::Audio(err) => Some(err),
            InferenceError::Extraction(err) => Some(err),
            InferenceError::Model(err) => Some(err),
        }
    }
}

impl From<AudioError> for InferenceError {
    fn from(err: AudioError) -> Self {
        InferenceError::Audio(err)
    }
}

impl From<ExtractionError> for InferenceError {
    fn from(err: ExtractionError) -> Self {
        InferenceError::Extraction(err)
    }
}

impl From<ModelError> for InferenceError {
    fn from(err: ModelError) -> Self {
        InferenceError::Model(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inference_error_delegates_code_and_stage() {
        let err: InferenceError = ExtractionError::EmptyWaveform.into();
        assert_eq!(err.code(), ExtractionErrorCodes::EMPTY_WAVEFORM);
        assert_eq!(err.stage(), "extraction");

        let err: InferenceError = AudioError::NoSamples.into();
        assert_eq!(err.code(), AudioErrorCodes::NO_SAMPLES);
        assert_eq!(err.stage(), "decode");
    }

    #[test]
    fn test_inference_error_display_matches_inner() {
        let inner = ModelError::ArtifactParse {
            reason: "expected value".to_string(),
        };
        let err = InferenceError::from(inner.clone());
        assert_eq!(err.to_string(), inner.to_string());
    }
}
