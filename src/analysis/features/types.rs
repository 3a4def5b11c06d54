// Types module - Data structures for transform outputs and feature vectors
//
// This module defines the core data structures used throughout the feature
// extraction pipeline: the per-transform matrix, its scalar summary, and the
// final ordered feature vector.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::schema::{FeatureSchema, Statistic, FEATURE_COUNT, FEATURE_SCHEMA};

/// Output of one transform: `n_bands` rows × `n_frames` columns, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    n_bands: usize,
    n_frames: usize,
    values: Vec<f64>,
}

impl FeatureMatrix {
    pub fn zeros(n_bands: usize, n_frames: usize) -> Self {
        Self {
            n_bands,
            n_frames,
            values: vec![0.0; n_bands * n_frames],
        }
    }

    /// Build a single-band matrix from per-frame values
    pub fn from_row(values: Vec<f64>) -> Self {
        Self {
            n_bands: 1,
            n_frames: values.len(),
            values,
        }
    }

    pub fn n_bands(&self) -> usize {
        self.n_bands
    }

    pub fn n_frames(&self) -> usize {
        self.n_frames
    }

    pub fn get(&self, band: usize, frame: usize) -> f64 {
        self.values[band * self.n_frames + frame]
    }

    pub fn set(&mut self, band: usize, frame: usize, value: f64) {
        self.values[band * self.n_frames + frame] = value;
    }

    pub fn row(&self, band: usize) -> &[f64] {
        &self.values[band * self.n_frames..(band + 1) * self.n_frames]
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// Reduce every element of the matrix to mean/std/min/max
    pub fn summarize(&self) -> Summary {
        Summary::of(&self.values)
    }
}

/// Scalar statistics over all elements of a matrix
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub mean: f64,
    /// Population standard deviation (ddof = 0)
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

impl Summary {
    /// Two-pass mean/variance; an empty slice yields NaN everywhere
    pub fn of(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self {
                mean: f64::NAN,
                std: f64::NAN,
                min: f64::NAN,
                max: f64::NAN,
            };
        }

        let n = values.len() as f64;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &v in values {
            sum += v;
            min = min.min(v);
            max = max.max(v);
        }
        let mean = sum / n;
        let variance = values.iter().map(|&v| (v - mean) * (v - mean)).sum::<f64>() / n;

        Self {
            mean,
            std: variance.sqrt(),
            min,
            max,
        }
    }

    pub fn get(&self, statistic: Statistic) -> f64 {
        match statistic {
            Statistic::Mean => self.mean,
            Statistic::Std => self.std,
            Statistic::Min => self.min,
            Statistic::Max => self.max,
        }
    }
}

/// Fixed-order feature vector handed to the classifier
///
/// Entry `i` is the statistic named by `FEATURE_SCHEMA.slots[i]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    pub(crate) fn from_values(values: [f64; FEATURE_COUNT]) -> Self {
        Self { values }
    }

    pub fn schema(&self) -> &'static FeatureSchema {
        &FEATURE_SCHEMA
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        FEATURE_COUNT
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Look a feature up by its schema name
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_SCHEMA.position(name).map(|i| self.values[i])
    }

    /// `(name, value)` pairs in vector order
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_SCHEMA.names().zip(self.values.iter().copied())
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.values.to_vec()
    }
}

/// Serializes as an ordered `{name: value}` map
impl Serialize for FeatureVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FEATURE_COUNT))?;
        for (name, value) in self.named() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}
