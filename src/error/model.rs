// Classifier artifact error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Model error code constants
///
/// Error code range: 3001-3005
pub struct ModelErrorCodes {}

impl ModelErrorCodes {
    /// Artifact file could not be read
    pub const ARTIFACT_READ: i32 = 3001;

    /// Artifact contents are not valid JSON for the expected layout
    pub const ARTIFACT_PARSE: i32 = 3002;

    /// Artifact was trained against a different feature schema version
    pub const SCHEMA_VERSION_MISMATCH: i32 = 3003;

    /// Artifact lists features in a different order or count
    pub const FEATURE_ORDER_MISMATCH: i32 = 3004;

    /// Artifact is structurally inconsistent
    pub const INVALID_ARTIFACT: i32 = 3005;
}

/// Log a model error with structured context
pub fn log_model_error(err: &ModelError, context: &str) {
    error!(
        "Model error in {}: code={}, component=Classifier, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised while loading or validating a classifier artifact
///
/// Error code ranges: 3001-3005
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Artifact file could not be read
    ArtifactRead { path: String, reason: String },

    /// Artifact contents are not valid JSON for the expected layout
    ArtifactParse { reason: String },

    /// Artifact was trained against a different feature schema version
    SchemaVersionMismatch { expected: u32, found: u32 },

    /// Artifact lists features in a different order or count
    FeatureOrderMismatch {
        position: usize,
        expected: Option<String>,
        found: Option<String>,
    },

    /// Artifact is structurally inconsistent
    InvalidArtifact { reason: String },
}

impl ModelError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        ModelError::InvalidArtifact {
            reason: reason.into(),
        }
    }
}

impl ErrorCode for ModelError {
    fn code(&self) -> i32 {
        match self {
            ModelError::ArtifactRead { .. } => ModelErrorCodes::ARTIFACT_READ,
            ModelError::ArtifactParse { .. } => ModelErrorCodes::ARTIFACT_PARSE,
            ModelError::SchemaVersionMismatch { .. } => ModelErrorCodes::SCHEMA_VERSION_MISMATCH,
            ModelError::FeatureOrderMismatch { .. } => ModelErrorCodes::FEATURE_ORDER_MISMATCH,
            ModelError::InvalidArtifact { .. } => ModelErrorCodes::INVALID_ARTIFACT,
        }
    }

    fn message(&self) -> String {
        match self {
            ModelError::ArtifactRead { path, reason } => {
                format!("Failed to read model artifact {}: {}", path, reason)
            }
            ModelError::ArtifactParse { reason } => {
                format!("Failed to parse model artifact: {}", reason)
            }
            ModelError::SchemaVersionMismatch { expected, found } => {
                format!(
                    "Model was trained on feature schema v{} but this build extracts v{}",
                    found, expected
                )
            }
            ModelError::FeatureOrderMismatch {
                position,
                expected,
                found,
            } => format!(
                "Feature {} mismatch: expected {}, artifact has {}",
                position,
                expected.as_deref().unwrap_or("<none>"),
                found.as_deref().unwrap_or("<none>")
            ),
            ModelError::InvalidArtifact { reason } => {
                format!("Invalid model artifact: {}", reason)
            }
        }
    }
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ModelError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for ModelError {}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::ArtifactParse {
            reason: err.to_string(),
        }
    }
}
