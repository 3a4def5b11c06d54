// Audio decoding error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Audio error code constants
///
/// Error code range: 1001-1003
pub struct AudioErrorCodes {}

impl AudioErrorCodes {
    /// Container or PCM payload could not be decoded
    pub const DECODE_FAILED: i32 = 1001;

    /// Sample encoding is not supported
    pub const UNSUPPORTED_FORMAT: i32 = 1002;

    /// Clip decoded successfully but contains no samples
    pub const NO_SAMPLES: i32 = 1003;
}

/// Log an audio error with structured context
///
/// The logging is non-blocking and will not panic on failure.
pub fn log_audio_error(err: &AudioError, context: &str) {
    error!(
        "Audio error in {}: code={}, component=AudioDecoder, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised while turning uploaded bytes into samples
///
/// Error code ranges: 1001-1003
#[derive(Debug, Clone, PartialEq)]
pub enum AudioError {
    /// Container or PCM payload could not be decoded
    DecodeFailed { reason: String },

    /// Sample encoding is not supported
    UnsupportedFormat { details: String },

    /// Clip decoded successfully but contains no samples
    NoSamples,
}

impl ErrorCode for AudioError {
    fn code(&self) -> i32 {
        match self {
            AudioError::DecodeFailed { .. } => AudioErrorCodes::DECODE_FAILED,
            AudioError::UnsupportedFormat { .. } => AudioErrorCodes::UNSUPPORTED_FORMAT,
            AudioError::NoSamples => AudioErrorCodes::NO_SAMPLES,
        }
    }

    fn message(&self) -> String {
        match self {
            AudioError::DecodeFailed { reason } => {
                format!("Failed to decode audio: {}", reason)
            }
            AudioError::UnsupportedFormat { details } => {
                format!("Unsupported audio format: {}", details)
            }
            AudioError::NoSamples => "Audio file contains no samples".to_string(),
        }
    }
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AudioError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for AudioError {}

impl From<hound::Error> for AudioError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::Unsupported => AudioError::UnsupportedFormat {
                details: err.to_string(),
            },
            other => AudioError::DecodeFailed {
                reason: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_error_codes() {
        assert_eq!(
            AudioError::DecodeFailed {
                reason: "x".to_string()
            }
            .code(),
            1001
        );
        assert_eq!(
            AudioError::UnsupportedFormat {
                details: "x".to_string()
            }
            .code(),
            1002
        );
        assert_eq!(AudioError::NoSamples.code(), 1003);
    }

    #[test]
    fn test_hound_unsupported_maps_to_unsupported_format() {
        let err: AudioError = hound::Error::Unsupported.into();
        assert_eq!(err.code(), AudioErrorCodes::UNSUPPORTED_FORMAT);
    }

    #[test]
    fn test_display_contains_code() {
        let display = AudioError::NoSamples.to_string();
        assert!(display.contains("1003"));
        assert!(display.contains("no samples"));
    }
}
