// Respiro - respiratory sound classification
// Fixed-length spectral feature extraction and trained-model inference

// Module declarations
pub mod analysis;
pub mod audio;
pub mod config;
pub mod context;
pub mod error;
#[cfg(feature = "http")]
pub mod http;

// Re-exports for convenience
pub use analysis::classifier::{ClassProbability, Classifier, Prediction};
pub use analysis::features::{
    FeatureExtractor, FeatureSchema, FeatureVector, SchemaDescriptor, FEATURE_COUNT,
    FEATURE_SCHEMA, SCHEMA_VERSION,
};
pub use analysis::model::{ModelArtifact, TrainedModel};
pub use audio::{normalize, NormalizedWaveform, Waveform};
pub use config::AppConfig;
pub use context::InferenceContext;
pub use error::{AudioError, ErrorCode, ExtractionError, InferenceError, ModelError};

use once_cell::sync::OnceCell;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static LOGGING: OnceCell<()> = OnceCell::new();

/// Install the global tracing subscriber (fmt layer, `RUST_LOG` filter, default `info`)
///
/// `log` records from library code are forwarded through the same
/// subscriber. Safe to call more than once; only the first call installs.
pub fn init_logging() {
    LOGGING.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let installed = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init();
        if let Err(err) = installed {
            eprintln!("respiro: logging already initialized: {}", err);
        }
    });
}
