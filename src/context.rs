// InferenceContext: Dependency Injection Container
// Holds the shared extractor and the loaded classifier for every request

use std::path::Path;
use std::sync::Arc;

use crate::analysis::classifier::{Classifier, Prediction};
use crate::analysis::features::{FeatureExtractor, FeatureVector};
use crate::analysis::model::TrainedModel;
use crate::audio::{decode_wav_bytes, DecodedAudio};
use crate::error::{
    log_audio_error, log_extraction_error, log_model_error, InferenceError, ModelError,
};

/// Dependency injection container for the classification pipeline
///
/// The classifier is loaded once and injected here as an immutable handle;
/// cloning the context shares both the extractor and the model. Nothing is
/// mutated after construction, so no locks are needed.
#[derive(Clone)]
pub struct InferenceContext {
    extractor: Arc<FeatureExtractor>,
    classifier: Arc<dyn Classifier>,
}

impl InferenceContext {
    /// Create a context around an already constructed classifier
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self {
            extractor: Arc::new(FeatureExtractor::new()),
            classifier,
        }
    }

    /// Load a JSON model artifact and build a context around it
    ///
    /// # Errors
    /// Any `ModelError` from reading or validating the artifact
    pub fn from_model_path<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let model = TrainedModel::load(path).map_err(|err| {
            log_model_error(&err, "from_model_path");
            err
        })?;
        Ok(Self::new(Arc::new(model)))
    }

    pub fn classifier(&self) -> &Arc<dyn Classifier> {
        &self.classifier
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    /// Normalize and extract features from raw mono samples
    pub fn features(&self, samples: &[f32], sample_rate: u32) -> Result<FeatureVector, InferenceError> {
        self.extractor
            .extract_samples(samples, sample_rate)
            .map_err(|err| {
                log_extraction_error(&err, "features");
                InferenceError::from(err)
            })
    }

    /// Classify raw mono samples
    pub fn classify_samples(
        &self,
        samples: &[f32],
        sample_rate: u32,
    ) -> Result<Prediction, InferenceError> {
        let features = self.features(samples, sample_rate)?;
        let prediction = self.classifier.classify(&features);

        tracing::info!(
            "[Inference] prediction={} probability={:.3}",
            prediction.label,
            prediction.probability
        );
        Ok(prediction)
    }

    /// Decode an uploaded WAV clip
    pub fn decode(&self, bytes: &[u8]) -> Result<DecodedAudio, InferenceError> {
        decode_wav_bytes(bytes).map_err(|err| {
            log_audio_error(&err, "decode");
            InferenceError::from(err)
        })
    }

    /// Decode a WAV clip and extract its features
    pub fn features_from_wav_bytes(&self, bytes: &[u8]) -> Result<FeatureVector, InferenceError> {
        let audio = self.decode(bytes)?;
        self.features(&audio.samples, audio.sample_rate)
    }

    /// Decode a WAV clip and classify it
    pub fn classify_wav_bytes(&self, bytes: &[u8]) -> Result<Prediction, InferenceError> {
        let audio = self.decode(bytes)?;
        self.classify_samples(&audio.samples, audio.sample_rate)
    }
}

impl std::fmt::Debug for InferenceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceContext")
            .field("labels", &self.classifier.labels())
            .finish()
    }
}
