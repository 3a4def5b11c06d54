//! Model artifact loading and end-to-end classification through InferenceContext

use std::io::Write;

use rand::{Rng, SeedableRng};
use respiro::{
    Classifier, ErrorCode, InferenceContext, InferenceError, ModelError, FEATURE_COUNT,
    FEATURE_SCHEMA,
};
use serde_json::json;
use tempfile::NamedTempFile;

const ZCR_MEAN: usize = 26;

/// Single-split forest: low zero-crossing rate reads as Healthy
fn forest_artifact() -> serde_json::Value {
    json!({
        "schema": FEATURE_SCHEMA.descriptor(),
        "labels": ["Healthy", "Crackles"],
        "estimator": {
            "kind": "random_forest",
            "trees": [{
                "children_left": [1, -1, -1],
                "children_right": [2, -1, -1],
                "feature": [ZCR_MEAN, -2, -2],
                "threshold": [0.05, -2.0, -2.0],
                "value": [[4.0, 4.0], [4.0, 0.0], [0.0, 4.0]]
            }]
        }
    })
}

fn write_artifact(value: &serde_json::Value) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(value.to_string().as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn wav_bytes(samples: &[f32], sample_rate: u32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &s in samples {
            writer.write_sample((s * i16::MAX as f32) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

fn noise(len: usize) -> Vec<f32> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    (0..len).map(|_| rng.gen_range(-0.5..0.5)).collect()
}

#[test]
fn classifies_wav_uploads_with_a_loaded_forest() {
    let artifact = write_artifact(&forest_artifact());
    let context = InferenceContext::from_model_path(artifact.path()).unwrap();
    assert_eq!(context.classifier().labels(), ["Healthy", "Crackles"]);

    let quiet = context
        .classify_wav_bytes(&wav_bytes(&vec![0.0; 16_000], 16_000))
        .unwrap();
    assert_eq!(quiet.label, "Healthy");
    assert_eq!(quiet.probability, 1.0);

    let noisy = context
        .classify_wav_bytes(&wav_bytes(&noise(16_000 * 5), 16_000))
        .unwrap();
    assert_eq!(noisy.label, "Crackles");
    assert_eq!(noisy.probabilities.len(), 2);
    assert_eq!(noisy.probabilities[1].label, "Crackles");
}

#[test]
fn prediction_serializes_with_prediction_key() {
    let artifact = write_artifact(&forest_artifact());
    let context = InferenceContext::from_model_path(artifact.path()).unwrap();
    let prediction = context.classify_samples(&vec![0.0; 8000], 8000).unwrap();

    let value = serde_json::to_value(&prediction).unwrap();
    assert_eq!(value["prediction"], "Healthy");
    assert_eq!(value["probability"], 1.0);
}

#[test]
fn logistic_artifact_with_scaler_loads_from_disk() {
    let mut coefficients = vec![vec![0.0; FEATURE_COUNT]; 1];
    coefficients[0][ZCR_MEAN] = 100.0;
    let mut mean = vec![0.0; FEATURE_COUNT];
    mean[ZCR_MEAN] = 0.1;

    let artifact = write_artifact(&json!({
        "schema": FEATURE_SCHEMA.descriptor(),
        "labels": ["Healthy", "Wheeze"],
        "scaler": {"mean": mean, "scale": vec![1.0; FEATURE_COUNT]},
        "estimator": {"kind": "logistic", "coefficients": coefficients, "intercepts": [0.0]}
    }));
    let context = InferenceContext::from_model_path(artifact.path()).unwrap();

    assert_eq!(
        context.classify_samples(&vec![0.0; 8000], 8000).unwrap().label,
        "Healthy"
    );
    assert_eq!(
        context.classify_samples(&noise(8000 * 3), 8000).unwrap().label,
        "Wheeze"
    );
}

#[test]
fn missing_or_mismatched_artifacts_are_rejected() {
    let err = InferenceContext::from_model_path("does/not/exist.json").unwrap_err();
    assert!(matches!(err, ModelError::ArtifactRead { .. }));

    let garbage = NamedTempFile::new().unwrap();
    std::fs::write(garbage.path(), "{ not json").unwrap();
    let err = InferenceContext::from_model_path(garbage.path()).unwrap_err();
    assert!(matches!(err, ModelError::ArtifactParse { .. }));

    let mut artifact = forest_artifact();
    artifact["schema"]["features"][0] = json!("chroma_stft_median");
    let file = write_artifact(&artifact);
    let err = InferenceContext::from_model_path(file.path()).unwrap_err();
    assert!(matches!(err, ModelError::FeatureOrderMismatch { position: 0, .. }));
}

#[test]
fn bad_uploads_report_their_stage() {
    let artifact = write_artifact(&forest_artifact());
    let context = InferenceContext::from_model_path(artifact.path()).unwrap();

    let err = context.classify_wav_bytes(b"RIFF....junk").unwrap_err();
    assert_eq!(err.stage(), "decode");

    // Contrast bands do not fit under a 500 Hz Nyquist
    let err = context
        .classify_wav_bytes(&wav_bytes(&noise(1000), 1000))
        .unwrap_err();
    assert!(matches!(err, InferenceError::Extraction(_)));
    assert_eq!(err.code(), 2005);
}
