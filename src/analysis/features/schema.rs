// Schema module - the ordered feature contract
//
// FEATURE_SCHEMA is the single source of truth for which statistic of which
// transform sits at each position of the feature vector. The extractor fills
// the vector by walking this table, and model artifacts are checked against
// its serialized descriptor at load time.

use serde::{Deserialize, Serialize};

/// Number of entries in every feature vector
pub const FEATURE_COUNT: usize = 30;

/// Version of the feature layout; bump on any change to order or parameters
pub const SCHEMA_VERSION: u32 = 1;

/// Spectral/timbral analysis families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    Chroma,
    Mfcc,
    MelSpectrogram,
    SpectralContrast,
    SpectralCentroid,
    SpectralBandwidth,
    SpectralRolloff,
    ZeroCrossingRate,
}

impl Transform {
    /// All transforms in vector order
    pub const ALL: [Transform; 8] = [
        Transform::Chroma,
        Transform::Mfcc,
        Transform::MelSpectrogram,
        Transform::SpectralContrast,
        Transform::SpectralCentroid,
        Transform::SpectralBandwidth,
        Transform::SpectralRolloff,
        Transform::ZeroCrossingRate,
    ];

    /// Stable name used as the feature-name prefix
    pub const fn key(self) -> &'static str {
        match self {
            Transform::Chroma => "chroma_stft",
            Transform::Mfcc => "mfcc",
            Transform::MelSpectrogram => "melspectrogram",
            Transform::SpectralContrast => "spectral_contrast",
            Transform::SpectralCentroid => "spectral_centroid",
            Transform::SpectralBandwidth => "spectral_bandwidth",
            Transform::SpectralRolloff => "spectral_rolloff",
            Transform::ZeroCrossingRate => "zero_crossing_rate",
        }
    }
}

/// Scalar reductions applied to a transform matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    Mean,
    /// Population standard deviation
    Std,
    Max,
    Min,
}

impl Statistic {
    pub const fn key(self) -> &'static str {
        match self {
            Statistic::Mean => "mean",
            Statistic::Std => "std",
            Statistic::Max => "max",
            Statistic::Min => "min",
        }
    }
}

/// One position in the feature vector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureSlot {
    pub transform: Transform,
    pub statistic: Statistic,
    pub name: &'static str,
}

const fn slot(transform: Transform, statistic: Statistic, name: &'static str) -> FeatureSlot {
    FeatureSlot {
        transform,
        statistic,
        name,
    }
}

/// Versioned, ordered list of feature slots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureSchema {
    pub version: u32,
    pub slots: [FeatureSlot; FEATURE_COUNT],
}

use Statistic::{Max, Mean, Min, Std};
use Transform::*;

/// The feature layout the classifier was trained on
pub const FEATURE_SCHEMA: FeatureSchema = FeatureSchema {
    version: SCHEMA_VERSION,
    slots: [
        slot(Chroma, Mean, "chroma_stft_mean"),
        slot(Chroma, Std, "chroma_stft_std"),
        slot(Chroma, Min, "chroma_stft_min"),
        slot(Mfcc, Mean, "mfcc_mean"),
        slot(Mfcc, Std, "mfcc_std"),
        slot(Mfcc, Max, "mfcc_max"),
        slot(Mfcc, Min, "mfcc_min"),
        slot(MelSpectrogram, Mean, "melspectrogram_mean"),
        slot(MelSpectrogram, Std, "melspectrogram_std"),
        slot(MelSpectrogram, Max, "melspectrogram_max"),
        slot(SpectralContrast, Mean, "spectral_contrast_mean"),
        slot(SpectralContrast, Std, "spectral_contrast_std"),
        slot(SpectralContrast, Max, "spectral_contrast_max"),
        slot(SpectralContrast, Min, "spectral_contrast_min"),
        slot(SpectralCentroid, Mean, "spectral_centroid_mean"),
        slot(SpectralCentroid, Std, "spectral_centroid_std"),
        slot(SpectralCentroid, Max, "spectral_centroid_max"),
        slot(SpectralCentroid, Min, "spectral_centroid_min"),
        slot(SpectralBandwidth, Mean, "spectral_bandwidth_mean"),
        slot(SpectralBandwidth, Std, "spectral_bandwidth_std"),
        slot(SpectralBandwidth, Max, "spectral_bandwidth_max"),
        slot(SpectralBandwidth, Min, "spectral_bandwidth_min"),
        slot(SpectralRolloff, Mean, "spectral_rolloff_mean"),
        slot(SpectralRolloff, Std, "spectral_rolloff_std"),
        slot(SpectralRolloff, Max, "spectral_rolloff_max"),
        slot(SpectralRolloff, Min, "spectral_rolloff_min"),
        slot(ZeroCrossingRate, Mean, "zero_crossing_rate_mean"),
        slot(ZeroCrossingRate, Std, "zero_crossing_rate_std"),
        slot(ZeroCrossingRate, Max, "zero_crossing_rate_max"),
        slot(ZeroCrossingRate, Min, "zero_crossing_rate_min"),
    ],
};

impl FeatureSchema {
    /// Feature names in vector order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.slots.iter().map(|slot| slot.name)
    }

    /// Position of a named feature
    pub fn position(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|slot| slot.name == name)
    }

    /// Serializable form shared with training code and model artifacts
    pub fn descriptor(&self) -> SchemaDescriptor {
        SchemaDescriptor {
            version: self.version,
            features: self.names().map(str::to_string).collect(),
        }
    }
}

/// Serialized feature schema: `{"version": 1, "features": [...]}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    pub version: u32,
    pub features: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_schema_has_thirty_unique_names() {
        let names: HashSet<&str> = FEATURE_SCHEMA.names().collect();
        assert_eq!(names.len(), FEATURE_COUNT);
    }

    #[test]
    fn test_names_follow_transform_and_statistic_keys() {
        for slot in FEATURE_SCHEMA.slots.iter() {
            let expected = format!("{}_{}", slot.transform.key(), slot.statistic.key());
            assert_eq!(slot.name, expected);
        }
    }

    #[test]
    fn test_per_transform_statistic_counts() {
        let count = |t: Transform| FEATURE_SCHEMA.slots.iter().filter(|s| s.transform == t).count();
        assert_eq!(count(Transform::Chroma), 3);
        assert_eq!(count(Transform::Mfcc), 4);
        assert_eq!(count(Transform::MelSpectrogram), 3);
        assert_eq!(count(Transform::SpectralContrast), 4);
        assert_eq!(count(Transform::SpectralCentroid), 4);
        assert_eq!(count(Transform::SpectralBandwidth), 4);
        assert_eq!(count(Transform::SpectralRolloff), 4);
        assert_eq!(count(Transform::ZeroCrossingRate), 4);
    }

    #[test]
    fn test_transforms_are_contiguous_in_declared_order() {
        let mut order: Vec<Transform> = Vec::new();
        for slot in FEATURE_SCHEMA.slots.iter() {
            if order.last() != Some(&slot.transform) {
                order.push(slot.transform);
            }
        }
        assert_eq!(order, Transform::ALL.to_vec());
    }

    #[test]
    fn test_fixed_positions() {
        assert_eq!(FEATURE_SCHEMA.position("chroma_stft_mean"), Some(0));
        assert_eq!(FEATURE_SCHEMA.position("mfcc_mean"), Some(3));
        assert_eq!(FEATURE_SCHEMA.position("melspectrogram_max"), Some(9));
        assert_eq!(FEATURE_SCHEMA.position("spectral_contrast_mean"), Some(10));
        assert_eq!(FEATURE_SCHEMA.position("zero_crossing_rate_mean"), Some(26));
        assert_eq!(FEATURE_SCHEMA.position("zero_crossing_rate_min"), Some(29));
        assert_eq!(FEATURE_SCHEMA.position("chroma_stft_max"), None);
    }

    #[test]
    fn test_descriptor_json_shape() {
        let json = serde_json::to_value(FEATURE_SCHEMA.descriptor()).unwrap();
        assert_eq!(json["version"], 1);
        assert_eq!(json["features"].as_array().unwrap().len(), FEATURE_COUNT);
        assert_eq!(json["features"][3], "mfcc_mean");
    }
}
