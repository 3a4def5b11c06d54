// FeatureExtractor - DSP feature extraction for respiratory sound classification
//
// This module turns a normalized 10-second waveform into the 30-value feature
// vector the classifier was trained on. Eight transforms are computed over the
// whole clip and each is reduced to a few scalar statistics taken over every
// element of its output matrix.
//
// Module organization:
// - params: Pinned analysis constants
// - schema: Ordered feature contract (FEATURE_SCHEMA)
// - types: Transform matrices, summaries and the feature vector
// - fft: Centered STFT with a periodic Hann window
// - mel: Mel filterbank, dB scaling and MFCC
// - chroma: Tuning estimation and chromagram
// - spectral: Centroid, bandwidth, rolloff and contrast
// - temporal: Zero-crossing rate
// - mod.rs: Coordinator (FeatureExtractor)
//
// Transforms and the statistics kept:
// 1. Chroma (12 × frames): mean, std, min
// 2. MFCC (13 × frames): mean, std, max, min
// 3. Mel spectrogram (128 × frames, power): mean, std, max
// 4. Spectral contrast (5 × frames, dB): mean, std, max, min
// 5. Spectral centroid (Hz): mean, std, max, min
// 6. Spectral bandwidth (Hz): mean, std, max, min
// 7. Spectral rolloff (Hz): mean, std, max, min
// 8. Zero-crossing rate: mean, std, max, min
//
// References:
// - Peeters, G. (2004). A large set of audio features for sound description
// - McFee, B. et al. (2015). librosa: Audio and music signal analysis in python

mod chroma;
mod fft;
mod mel;
pub mod params;
mod schema;
mod spectral;
mod temporal;
mod types;

pub use schema::{
    FeatureSchema, FeatureSlot, SchemaDescriptor, Statistic, Transform, FEATURE_COUNT,
    FEATURE_SCHEMA, SCHEMA_VERSION,
};
pub use types::{FeatureMatrix, FeatureVector, Summary};

use crate::audio::{normalize, NormalizedWaveform};
use crate::error::ExtractionError;
use fft::StftProcessor;
use mel::MelFilterbank;
use params::{
    CONTRAST_FMIN_HZ, CONTRAST_N_BANDS, CONTRAST_QUANTILE, HOP_LENGTH, N_CHROMA, N_FFT, N_MELS,
    N_MFCC, ZCR_FRAME_LENGTH, ZCR_HOP_LENGTH,
};
use spectral::{SpectralContrast, SpectralFeatures};
use temporal::TemporalFeatures;

/// Per-transform summaries of one clip
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformSummaries {
    pub chroma: Summary,
    pub mfcc: Summary,
    pub mel_spectrogram: Summary,
    pub spectral_contrast: Summary,
    pub spectral_centroid: Summary,
    pub spectral_bandwidth: Summary,
    pub spectral_rolloff: Summary,
    pub zero_crossing_rate: Summary,
}

impl TransformSummaries {
    pub fn get(&self, transform: Transform) -> &Summary {
        match transform {
            Transform::Chroma => &self.chroma,
            Transform::Mfcc => &self.mfcc,
            Transform::MelSpectrogram => &self.mel_spectrogram,
            Transform::SpectralContrast => &self.spectral_contrast,
            Transform::SpectralCentroid => &self.spectral_centroid,
            Transform::SpectralBandwidth => &self.spectral_bandwidth,
            Transform::SpectralRolloff => &self.spectral_rolloff,
            Transform::ZeroCrossingRate => &self.zero_crossing_rate,
        }
    }

    /// Lay the summaries out in FEATURE_SCHEMA order
    ///
    /// # Errors
    /// `NonFiniteFeature` naming the first slot that is NaN or infinite
    pub fn to_feature_vector(&self) -> Result<FeatureVector, ExtractionError> {
        let mut values = [0.0; FEATURE_COUNT];
        for (value, slot) in values.iter_mut().zip(FEATURE_SCHEMA.slots.iter()) {
            let v = self.get(slot.transform).get(slot.statistic);
            if !v.is_finite() {
                return Err(ExtractionError::NonFiniteFeature { feature: slot.name });
            }
            *value = v;
        }
        Ok(FeatureVector::from_values(values))
    }
}

/// FeatureExtractor coordinates the DSP feature extraction pipeline
///
/// Holds the planned FFT; filterbanks depend on the clip's sample rate and
/// are built per call. Immutable after construction, so one instance can be
/// shared across threads.
pub struct FeatureExtractor {
    stft: StftProcessor,
    temporal_features: TemporalFeatures,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureExtractor {
    pub fn new() -> Self {
        Self {
            stft: StftProcessor::new(N_FFT, HOP_LENGTH),
            temporal_features: TemporalFeatures::new(ZCR_FRAME_LENGTH, ZCR_HOP_LENGTH),
        }
    }

    /// Compute all eight transforms and reduce each to its summary
    ///
    /// This method coordinates the entire feature extraction pipeline:
    /// 1. Magnitude and power spectrograms via the centered STFT
    /// 2. Mel power spectrogram, shared by the mel and MFCC statistics
    /// 3. Chromagram with per-clip tuning
    /// 4. Spectral shape descriptors and octave-band contrast
    /// 5. Zero-crossing rate from the time-domain signal
    pub fn summarize(
        &self,
        waveform: &NormalizedWaveform,
    ) -> Result<TransformSummaries, ExtractionError> {
        let sample_rate = waveform.sample_rate();
        let spectrogram = self.stft.magnitude_spectrogram(waveform.samples());
        let magnitude = spectrogram.magnitude();
        let power = spectrogram.power();

        let nyquist = sample_rate as f64 / 2.0;
        let mel_power =
            MelFilterbank::new(sample_rate, N_FFT, N_MELS, 0.0, nyquist).apply(&power);
        let mfcc = mel::mfcc(&mel_power, N_MFCC);
        let chroma = chroma::chromagram(&power, sample_rate, N_FFT, N_CHROMA);

        let contrast = SpectralContrast::new(
            sample_rate,
            N_FFT,
            CONTRAST_N_BANDS,
            CONTRAST_FMIN_HZ,
            CONTRAST_QUANTILE,
        )
        .map_err(|e| ExtractionError::TransformFailed {
            transform: Transform::SpectralContrast,
            reason: e.to_string(),
        })?
        .compute(magnitude);

        let spectral = SpectralFeatures::new(sample_rate, N_FFT);
        let zcr = self
            .temporal_features
            .zero_crossing_rate(waveform.samples());

        tracing::debug!(
            "[FeatureExtractor] {} frames, {} bins, sample_rate={}",
            spectrogram.n_frames(),
            spectrogram.n_bins(),
            sample_rate
        );

        Ok(TransformSummaries {
            chroma: chroma.summarize(),
            mfcc: mfcc.summarize(),
            mel_spectrogram: mel_power.summarize(),
            spectral_contrast: contrast.summarize(),
            spectral_centroid: spectral.centroid(magnitude).summarize(),
            spectral_bandwidth: spectral.bandwidth(magnitude).summarize(),
            spectral_rolloff: spectral.rolloff(magnitude).summarize(),
            zero_crossing_rate: zcr.summarize(),
        })
    }

    /// Extract the 30-value feature vector from a normalized waveform
    ///
    /// # Errors
    /// `TransformFailed` when a transform is undefined for the sample rate,
    /// `NonFiniteFeature` when an aggregate is not a finite number
    pub fn extract(&self, waveform: &NormalizedWaveform) -> Result<FeatureVector, ExtractionError> {
        self.summarize(waveform)?.to_feature_vector()
    }

    /// Normalize raw samples, then extract
    pub fn extract_samples(
        &self,
        samples: &[f32],
        sample_rate: u32,
    ) -> Result<FeatureVector, ExtractionError> {
        let normalized = normalize(samples, sample_rate)?;
        self.extract(&normalized)
    }
}
