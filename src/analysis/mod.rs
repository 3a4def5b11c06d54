// Analysis module - feature extraction and classification
//
// Pipeline: Waveform → normalize (10 s) → FeatureExtractor → FeatureVector
// → Classifier → Prediction.
//
// The extractor is stateless apart from its FFT plan; the classifier is an
// immutable trained model. Both are shared read-only across threads.

pub mod classifier;
pub mod features;
pub mod model;

use classifier::{Classifier, Prediction};
use features::{FeatureExtractor, FeatureVector};

use crate::error::ExtractionError;

/// One-shot extraction with a fresh extractor
///
/// Prefer a long-lived [`FeatureExtractor`] when processing many clips.
pub fn extract_features(samples: &[f32], sample_rate: u32) -> Result<FeatureVector, ExtractionError> {
    FeatureExtractor::new().extract_samples(samples, sample_rate)
}

/// Extract features and classify them in one call
pub fn classify_samples(
    extractor: &FeatureExtractor,
    classifier: &dyn Classifier,
    samples: &[f32],
    sample_rate: u32,
) -> Result<(FeatureVector, Prediction), ExtractionError> {
    let features = extractor.extract_samples(samples, sample_rate)?;
    let prediction = classifier.classify(&features);
    Ok((features, prediction))
}
