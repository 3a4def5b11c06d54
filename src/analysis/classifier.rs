// Classifier - respiratory condition prediction from feature vectors
//
// This module defines the interface between feature extraction and a trained
// model. A classifier maps one FeatureVector to a probability per diagnosis
// label; the predicted label is the most probable one (first label on ties).
//
// Implementations are immutable after construction and shared behind an Arc,
// so one loaded model serves every request.

use serde::Serialize;

use crate::analysis::features::FeatureVector;

/// Probability assigned to one label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassProbability {
    pub label: String,
    pub probability: f64,
}

/// Classification result for one clip
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Most probable label
    #[serde(rename = "prediction")]
    pub label: String,
    /// Probability of the predicted label
    pub probability: f64,
    /// Every label with its probability, in model label order
    pub probabilities: Vec<ClassProbability>,
}

/// Index of the largest value, first one on ties
pub(crate) fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, &v)| {
            if v > best.1 {
                (i, v)
            } else {
                best
            }
        })
        .0
}

/// Trained model over the 30-value feature vector
pub trait Classifier: Send + Sync {
    /// Class labels in probability order
    fn labels(&self) -> &[String];

    /// Probability per label; same length and order as `labels()`, sums to 1
    fn predict_proba(&self, features: &FeatureVector) -> Vec<f64>;

    /// Most probable label
    fn predict(&self, features: &FeatureVector) -> String {
        self.classify(features).label
    }

    /// Label, its probability and the full distribution in one pass
    ///
    /// Only labels with a matching probability take part. When there are
    /// none, the label is empty and its probability 0.
    fn classify(&self, features: &FeatureVector) -> Prediction {
        let probabilities = self.predict_proba(features);
        let labels = self.labels();
        if probabilities.len() != labels.len() {
            log::warn!(
                "[Classifier] {} probabilities for {} labels",
                probabilities.len(),
                labels.len()
            );
        }

        let paired = labels.len().min(probabilities.len());
        let best = argmax(&probabilities[..paired]);
        let (label, probability) = match (labels.get(best), probabilities.get(best)) {
            (Some(label), Some(&probability)) => (label.clone(), probability),
            _ => (String::new(), 0.0),
        };

        Prediction {
            label,
            probability,
            probabilities: labels
                .iter()
                .zip(&probabilities)
                .map(|(label, &probability)| ClassProbability {
                    label: label.clone(),
                    probability,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
#[path = "classifier_tests.rs"]
mod tests;
