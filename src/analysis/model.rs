// Model - JSON classifier artifacts
//
// A trained model ships as a JSON document holding the feature schema it was
// fitted against, its class labels, an optional standardization step and one
// estimator:
//
// - logistic: multinomial logistic regression (softmax over one coefficient
//   row per label), or a single row for binary problems (sigmoid)
// - random_forest: flattened decision trees, probabilities averaged across trees
//
// Everything is checked when the artifact is loaded, so prediction itself
// cannot fail.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::classifier::Classifier;
use crate::analysis::features::{FeatureVector, SchemaDescriptor, FEATURE_COUNT, FEATURE_SCHEMA};
use crate::error::ModelError;

/// Per-feature standardization: `(x - mean) / scale`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    fn validate(&self) -> Result<(), ModelError> {
        if self.mean.len() != FEATURE_COUNT || self.scale.len() != FEATURE_COUNT {
            return Err(ModelError::invalid(format!(
                "scaler expects {} means and scales, got {} and {}",
                FEATURE_COUNT,
                self.mean.len(),
                self.scale.len()
            )));
        }
        if self.mean.iter().any(|m| !m.is_finite()) {
            return Err(ModelError::invalid("scaler mean must be finite"));
        }
        if let Some(i) = self.scale.iter().position(|&s| s == 0.0 || !s.is_finite()) {
            return Err(ModelError::invalid(format!(
                "scaler scale for feature {} must be finite and non-zero",
                i
            )));
        }
        Ok(())
    }

    pub fn transform(&self, features: &[f64]) -> Vec<f64> {
        features
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| (x - mean) / scale)
            .collect()
    }
}

/// One fitted decision tree in flattened array form
///
/// Node `i` is a leaf when `children_left[i] == -1`; otherwise samples with
/// `x[feature[i]] <= threshold[i]` go to `children_left[i]`, the rest to
/// `children_right[i]`. `value[i]` holds per-class weights at the node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<Vec<f64>>,
}

const LEAF: i64 = -1;

impl DecisionTree {
    fn validate(&self, n_labels: usize) -> Result<(), ModelError> {
        let n_nodes = self.children_left.len();
        if n_nodes == 0 {
            return Err(ModelError::invalid("decision tree has no nodes"));
        }
        if self.children_right.len() != n_nodes
            || self.feature.len() != n_nodes
            || self.threshold.len() != n_nodes
            || self.value.len() != n_nodes
        {
            return Err(ModelError::invalid(
                "decision tree arrays have different lengths",
            ));
        }

        for node in 0..n_nodes {
            let (left, right) = (self.children_left[node], self.children_right[node]);
            if left == LEAF {
                let weights = &self.value[node];
                if weights.len() != n_labels {
                    return Err(ModelError::invalid(format!(
                        "leaf {} has {} class weights, expected {}",
                        node,
                        weights.len(),
                        n_labels
                    )));
                }
                let total: f64 = weights.iter().sum();
                if weights.iter().any(|w| *w < 0.0 || !w.is_finite()) || total <= 0.0 {
                    return Err(ModelError::invalid(format!(
                        "leaf {} class weights must be non-negative with a positive sum",
                        node
                    )));
                }
                continue;
            }

            // Children must point forward so traversal always terminates
            let node_index = node as i64;
            for child in [left, right] {
                if child <= node_index || child >= n_nodes as i64 {
                    return Err(ModelError::invalid(format!(
                        "node {} has out-of-order child {}",
                        node, child
                    )));
                }
            }
            let feature = self.feature[node];
            if feature < 0 || feature >= FEATURE_COUNT as i64 {
                return Err(ModelError::invalid(format!(
                    "node {} splits on unknown feature {}",
                    node, feature
                )));
            }
            if self.threshold[node].is_nan() {
                return Err(ModelError::invalid(format!(
                    "node {} has a NaN threshold",
                    node
                )));
            }
        }
        Ok(())
    }

    /// Normalized class distribution of the leaf reached by `x`
    fn leaf_distribution(&self, x: &[f64]) -> Vec<f64> {
        let mut node = 0;
        while self.children_left[node] != LEAF {
            // Trees are fitted on single-precision inputs
            let value = x[self.feature[node] as usize] as f32 as f64;
            node = if value <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }

        let weights = &self.value[node];
        let total: f64 = weights.iter().sum();
        weights.iter().map(|w| w / total).collect()
    }
}

/// Fitted estimator, tagged by `kind`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Estimator {
    Logistic {
        coefficients: Vec<Vec<f64>>,
        intercepts: Vec<f64>,
    },
    RandomForest {
        trees: Vec<DecisionTree>,
    },
}

impl Estimator {
    fn validate(&self, n_labels: usize) -> Result<(), ModelError> {
        match self {
            Estimator::Logistic {
                coefficients,
                intercepts,
            } => {
                let rows_ok = coefficients.len() == n_labels
                    || (n_labels == 2 && coefficients.len() == 1);
                if !rows_ok || intercepts.len() != coefficients.len() {
                    return Err(ModelError::invalid(format!(
                        "logistic model has {} coefficient rows and {} intercepts for {} labels",
                        coefficients.len(),
                        intercepts.len(),
                        n_labels
                    )));
                }
                if let Some(row) = coefficients.iter().find(|r| r.len() != FEATURE_COUNT) {
                    return Err(ModelError::invalid(format!(
                        "coefficient row has {} entries, expected {}",
                        row.len(),
                        FEATURE_COUNT
                    )));
                }
                let all_finite = coefficients.iter().flatten().chain(intercepts).all(|v| v.is_finite());
                if !all_finite {
                    return Err(ModelError::invalid("logistic weights must be finite"));
                }
                Ok(())
            }
            Estimator::RandomForest { trees } => {
                if trees.is_empty() {
                    return Err(ModelError::invalid("random forest has no trees"));
                }
                trees.iter().try_for_each(|tree| tree.validate(n_labels))
            }
        }
    }

    fn predict_proba(&self, x: &[f64]) -> Vec<f64> {
        match self {
            Estimator::Logistic {
                coefficients,
                intercepts,
            } => {
                let scores: Vec<f64> = coefficients
                    .iter()
                    .zip(intercepts)
                    .map(|(row, b)| row.iter().zip(x).map(|(w, v)| w * v).sum::<f64>() + b)
                    .collect();

                if scores.len() == 1 {
                    let positive = 1.0 / (1.0 + (-scores[0]).exp());
                    vec![1.0 - positive, positive]
                } else {
                    softmax(&scores)
                }
            }
            Estimator::RandomForest { trees } => {
                let mut averaged: Vec<f64> = Vec::new();
                for tree in trees {
                    let leaf = tree.leaf_distribution(x);
                    if averaged.is_empty() {
                        averaged = leaf;
                    } else {
                        for (acc, p) in averaged.iter_mut().zip(leaf) {
                            *acc += p;
                        }
                    }
                }
                let n_trees = trees.len() as f64;
                averaged.iter().map(|p| p / n_trees).collect()
            }
        }
    }
}

fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.iter().map(|e| e / total).collect()
}

/// On-disk classifier artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Feature schema the model was trained against
    pub schema: SchemaDescriptor,
    pub labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaler: Option<StandardScaler>,
    pub estimator: Estimator,
}

impl ModelArtifact {
    /// Reject artifacts trained against a different feature layout
    pub fn check_schema(&self) -> Result<(), ModelError> {
        let expected = FEATURE_SCHEMA.descriptor();
        if self.schema.version != expected.version {
            return Err(ModelError::SchemaVersionMismatch {
                expected: expected.version,
                found: self.schema.version,
            });
        }

        let len = expected.features.len().max(self.schema.features.len());
        for position in 0..len {
            let want = expected.features.get(position);
            let got = self.schema.features.get(position);
            if want != got {
                return Err(ModelError::FeatureOrderMismatch {
                    position,
                    expected: want.cloned(),
                    found: got.cloned(),
                });
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        self.check_schema()?;
        if self.labels.len() < 2 {
            return Err(ModelError::invalid(format!(
                "model needs at least two labels, got {}",
                self.labels.len()
            )));
        }
        if let Some(scaler) = &self.scaler {
            scaler.validate()?;
        }
        self.estimator.validate(self.labels.len())
    }
}

/// Validated, immutable classifier loaded from a [`ModelArtifact`]
#[derive(Debug, Clone)]
pub struct TrainedModel {
    labels: Vec<String>,
    scaler: Option<StandardScaler>,
    estimator: Estimator,
}

impl TrainedModel {
    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, ModelError> {
        artifact.validate()?;
        Ok(Self {
            labels: artifact.labels,
            scaler: artifact.scaler,
            estimator: artifact.estimator,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self, ModelError> {
        let artifact: ModelArtifact = serde_json::from_str(json)?;
        Self::from_artifact(artifact)
    }

    /// Load and validate an artifact file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| ModelError::ArtifactRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let model = Self::from_json_str(&contents)?;

        log::info!(
            "Loaded classifier from {}: {} labels, estimator={}",
            path.display(),
            model.labels.len(),
            model.estimator_kind()
        );
        Ok(model)
    }

    pub fn estimator_kind(&self) -> &'static str {
        match self.estimator {
            Estimator::Logistic { .. } => "logistic",
            Estimator::RandomForest { .. } => "random_forest",
        }
    }
}

impl Classifier for TrainedModel {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn predict_proba(&self, features: &FeatureVector) -> Vec<f64> {
        match &self.scaler {
            Some(scaler) => self.estimator.predict_proba(&scaler.transform(features.as_slice())),
            None => self.estimator.predict_proba(features.as_slice()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema_json() -> serde_json::Value {
        serde_json::to_value(FEATURE_SCHEMA.descriptor()).unwrap()
    }

    fn features_with(index: usize, value: f64) -> FeatureVector {
        let mut values = [0.0; FEATURE_COUNT];
        values[index] = value;
        FeatureVector::from_values(values)
    }

    fn logistic_artifact() -> serde_json::Value {
        let mut healthy = vec![0.0; FEATURE_COUNT];
        healthy[26] = -50.0;
        let mut copd = vec![0.0; FEATURE_COUNT];
        copd[26] = 50.0;
        json!({
            "schema": schema_json(),
            "labels": ["Healthy", "COPD", "URTI"],
            "estimator": {
                "kind": "logistic",
                "coefficients": [healthy, copd, vec![0.0; FEATURE_COUNT]],
                "intercepts": [0.0, 0.0, 0.0]
            }
        })
    }

    fn forest_artifact() -> serde_json::Value {
        // Split on zero_crossing_rate_mean (index 26) at 0.25
        json!({
            "schema": schema_json(),
            "labels": ["Healthy", "Pneumonia"],
            "estimator": {
                "kind": "random_forest",
                "trees": [
                    {
                        "children_left": [1, -1, -1],
                        "children_right": [2, -1, -1],
                        "feature": [26, -2, -2],
                        "threshold": [0.25, -2.0, -2.0],
                        "value": [[10.0, 10.0], [9.0, 1.0], [1.0, 9.0]]
                    },
                    {
                        "children_left": [-1],
                        "children_right": [-1],
                        "feature": [-2],
                        "threshold": [-2.0],
                        "value": [[1.0, 1.0]]
                    }
                ]
            }
        })
    }

    fn load(value: serde_json::Value) -> Result<TrainedModel, ModelError> {
        TrainedModel::from_json_str(&value.to_string())
    }

    #[test]
    fn test_logistic_softmax() {
        let model = load(logistic_artifact()).unwrap();
        assert_eq!(model.estimator_kind(), "logistic");

        let proba = model.predict_proba(&features_with(26, 1.0));
        assert_eq!(proba.len(), 3);
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert_eq!(model.predict(&features_with(26, 1.0)), "COPD");
        assert_eq!(model.predict(&features_with(26, -1.0)), "Healthy");

        // All scores equal: uniform, first label wins the tie
        let uniform = model.predict_proba(&features_with(0, 0.0));
        assert!(uniform.iter().all(|p| (p - 1.0 / 3.0).abs() < 1e-12));
        assert_eq!(model.predict(&features_with(0, 0.0)), "Healthy");
    }

    #[test]
    fn test_binary_logistic_single_row_is_sigmoid() {
        let mut row = vec![0.0; FEATURE_COUNT];
        row[0] = 1.0;
        let model = load(json!({
            "schema": schema_json(),
            "labels": ["Healthy", "Unhealthy"],
            "estimator": {"kind": "logistic", "coefficients": [row], "intercepts": [0.0]}
        }))
        .unwrap();

        let proba = model.predict_proba(&features_with(0, 0.0));
        assert_eq!(proba, vec![0.5, 0.5]);
        let proba = model.predict_proba(&features_with(0, 2.0));
        assert!((proba[1] - 1.0 / (1.0 + (-2.0_f64).exp())).abs() < 1e-12);
    }

    #[test]
    fn test_scaler_is_applied_before_estimator() {
        let mut artifact = logistic_artifact();
        let mut mean = vec![0.0; FEATURE_COUNT];
        mean[26] = 5.0;
        artifact["scaler"] = json!({"mean": mean, "scale": vec![1.0; FEATURE_COUNT]});
        let model = load(artifact).unwrap();

        // 4.0 - 5.0 < 0, so the Healthy row dominates
        assert_eq!(model.predict(&features_with(26, 4.0)), "Healthy");
        assert_eq!(model.predict(&features_with(26, 6.0)), "COPD");
    }

    #[test]
    fn test_random_forest_averages_leaf_distributions() {
        let model = load(forest_artifact()).unwrap();
        assert_eq!(model.estimator_kind(), "random_forest");

        // Low ZCR: (0.9 + 0.5) / 2, (0.1 + 0.5) / 2
        let proba = model.predict_proba(&features_with(26, 0.05));
        assert!((proba[0] - 0.7).abs() < 1e-12);
        assert!((proba[1] - 0.3).abs() < 1e-12);

        // Equal to the threshold goes left
        assert_eq!(model.predict(&features_with(26, 0.25)), "Healthy");
        assert_eq!(model.predict(&features_with(26, 0.5)), "Pneumonia");
    }

    #[test]
    fn test_rejects_schema_version_mismatch() {
        let mut artifact = logistic_artifact();
        artifact["schema"]["version"] = json!(2);
        assert_eq!(
            load(artifact).unwrap_err(),
            ModelError::SchemaVersionMismatch {
                expected: 1,
                found: 2
            }
        );
    }

    #[test]
    fn test_rejects_feature_order_mismatch() {
        let mut artifact = logistic_artifact();
        let features = artifact["schema"]["features"].as_array_mut().unwrap();
        features.swap(0, 1);
        match load(artifact).unwrap_err() {
            ModelError::FeatureOrderMismatch {
                position,
                expected,
                found,
            } => {
                assert_eq!(position, 0);
                assert_eq!(expected.as_deref(), Some("chroma_stft_mean"));
                assert_eq!(found.as_deref(), Some("chroma_stft_std"));
            }
            other => panic!("unexpected error {:?}", other),
        }

        let mut artifact = logistic_artifact();
        artifact["schema"]["features"].as_array_mut().unwrap().pop();
        assert!(matches!(
            load(artifact).unwrap_err(),
            ModelError::FeatureOrderMismatch {
                position: 29,
                found: None,
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_structurally_invalid_artifacts() {
        let mut artifact = logistic_artifact();
        artifact["labels"] = json!(["Healthy"]);
        assert!(matches!(
            load(artifact).unwrap_err(),
            ModelError::InvalidArtifact { .. }
        ));

        let mut artifact = logistic_artifact();
        artifact["estimator"]["intercepts"] = json!([0.0]);
        assert!(matches!(
            load(artifact).unwrap_err(),
            ModelError::InvalidArtifact { .. }
        ));

        let mut artifact = logistic_artifact();
        artifact["scaler"] = json!({"mean": vec![0.0; FEATURE_COUNT], "scale": vec![0.0; FEATURE_COUNT]});
        assert!(matches!(
            load(artifact).unwrap_err(),
            ModelError::InvalidArtifact { .. }
        ));

        // Child pointing backwards would loop forever
        let mut artifact = forest_artifact();
        artifact["estimator"]["trees"][0]["children_right"] = json!([0, -1, -1]);
        assert!(matches!(
            load(artifact).unwrap_err(),
            ModelError::InvalidArtifact { .. }
        ));
    }

    #[test]
    fn test_parse_and_read_errors() {
        assert!(matches!(
            TrainedModel::from_json_str("{not json").unwrap_err(),
            ModelError::ArtifactParse { .. }
        ));
        assert!(matches!(
            TrainedModel::from_json_str(r#"{"schema": {"version": 1, "features": []}}"#).unwrap_err(),
            ModelError::ArtifactParse { .. }
        ));
        assert!(matches!(
            TrainedModel::load("/nonexistent/model.json").unwrap_err(),
            ModelError::ArtifactRead { .. }
        ));
    }

    #[test]
    fn test_artifact_round_trips_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, forest_artifact().to_string()).unwrap();

        let model = TrainedModel::load(&path).unwrap();
        assert_eq!(model.labels(), &["Healthy".to_string(), "Pneumonia".to_string()]);
    }
}
