// Params module - pinned analysis constants
//
// Every value here is load-bearing for numerical compatibility with the
// trained classifier. They are constants, not configuration: changing any of
// them changes the meaning of the feature vector and requires a new
// FEATURE_SCHEMA version.

/// FFT size and analysis window length in samples
pub const N_FFT: usize = 2048;

/// Hop between successive analysis frames in samples
pub const HOP_LENGTH: usize = 512;

/// Highest accepted sample rate in Hz
pub const MAX_SAMPLE_RATE: u32 = 384_000;

/// Number of mel bands in the mel spectrogram (and the MFCC input)
pub const N_MELS: usize = 128;

/// Number of cepstral coefficients kept
pub const N_MFCC: usize = 13;

/// Number of pitch classes in the chromagram
pub const N_CHROMA: usize = 12;

/// Chroma weighting: centre octave of the Gaussian octave window
pub const CHROMA_CENTER_OCTAVE: f64 = 5.0;

/// Chroma weighting: width of the Gaussian octave window in octaves
pub const CHROMA_OCTAVE_WIDTH: f64 = 2.0;

/// Tuning histogram resolution in fractions of a chroma bin
pub const TUNING_RESOLUTION: f64 = 0.01;

/// Lowest frequency considered by the tuning estimator
pub const TUNING_FMIN_HZ: f64 = 150.0;

/// Upper frequency bound of the tuning estimator (exclusive)
pub const TUNING_FMAX_HZ: f64 = 4000.0;

/// Peak threshold relative to the frame maximum for the tuning estimator
pub const TUNING_PEAK_THRESHOLD: f64 = 0.1;

/// Number of octave bands in spectral contrast
pub const CONTRAST_N_BANDS: usize = 4;

/// Lower edge of the first contrast octave band
pub const CONTRAST_FMIN_HZ: f64 = 100.0;

/// Fraction of each sub-band averaged for peaks and valleys
pub const CONTRAST_QUANTILE: f64 = 0.02;

/// Fraction of spectral magnitude below the rolloff frequency
pub const ROLLOFF_PERCENT: f64 = 0.85;

/// ZCR frame length in samples
pub const ZCR_FRAME_LENGTH: usize = 2048;

/// ZCR hop in samples
pub const ZCR_HOP_LENGTH: usize = 512;

/// Samples with magnitude at or below this count as zero for ZCR
pub const ZCR_ZERO_THRESHOLD: f64 = 1e-10;

/// dB conversion: magnitude floor
pub const DB_AMIN: f64 = 1e-10;

/// dB conversion: dynamic range kept below the matrix maximum
pub const DB_TOP_DB: f64 = 80.0;

/// Norms below this are treated as silence and left unnormalized
pub const NORM_THRESHOLD: f64 = f32::MIN_POSITIVE as f64;
