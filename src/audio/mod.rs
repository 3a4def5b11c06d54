//! Audio input boundary: decoding, validation and fixed-duration normalization.
//!
//! Decoded clips enter the pipeline as a [`Waveform`] and leave this module as
//! a [`NormalizedWaveform`] of exactly `sample_rate * TARGET_DURATION_SECS`
//! samples, ready for feature extraction.

pub mod decode;
pub mod normalize;
pub mod waveform;

pub use decode::{decode_wav_bytes, decode_wav_file, DecodedAudio};
pub use normalize::{normalize, target_length, NormalizedWaveform, TARGET_DURATION_SECS};
pub use waveform::Waveform;
