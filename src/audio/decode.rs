// WAV decoding - uploaded bytes to mono f32 samples
//
// Decodes a RIFF/WAVE clip at its native sample rate. Integer PCM is scaled
// to [-1.0, 1.0) by 2^(bits - 1); multichannel audio is down-mixed by
// averaging the channels of each frame.

use std::io::Read;
use std::path::Path;

use hound::{SampleFormat, WavReader};

use crate::error::AudioError;

/// Decoded clip before waveform validation
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    /// Mono samples
    pub samples: Vec<f32>,
    /// Native sample rate in Hz
    pub sample_rate: u32,
    /// Channel count of the source file
    pub channels: u16,
}

/// Decode an in-memory WAV file
pub fn decode_wav_bytes(bytes: &[u8]) -> Result<DecodedAudio, AudioError> {
    let reader = WavReader::new(std::io::Cursor::new(bytes))?;
    decode(reader)
}

/// Decode a WAV file from disk
pub fn decode_wav_file<P: AsRef<Path>>(path: P) -> Result<DecodedAudio, AudioError> {
    let reader = WavReader::open(path.as_ref()).map_err(|err| match err {
        hound::Error::IoError(io) => AudioError::DecodeFailed {
            reason: format!("{}: {}", path.as_ref().display(), io),
        },
        other => AudioError::from(other),
    })?;
    decode(reader)
}

fn decode<R: Read>(mut reader: WavReader<R>) -> Result<DecodedAudio, AudioError> {
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(AudioError::UnsupportedFormat {
            details: "zero channels".to_string(),
        });
    }

    let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => reader.samples::<f32>().collect::<Result<_, _>>()?,
        (SampleFormat::Int, bits @ 1..=32) => {
            let scale = 1.0 / (1_u64 << (bits - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|sample| sample.map(|s| s as f32 * scale))
                .collect::<Result<_, _>>()?
        }
        (format, bits) => {
            return Err(AudioError::UnsupportedFormat {
                details: format!("{:?} with {} bits per sample", format, bits),
            })
        }
    };

    if interleaved.is_empty() {
        return Err(AudioError::NoSamples);
    }

    let samples = downmix(&interleaved, spec.channels as usize);
    log::debug!(
        "[Decoder] {} frames, {} Hz, {} channel(s)",
        samples.len(),
        spec.sample_rate,
        spec.channels
    );

    Ok(DecodedAudio {
        samples,
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}

/// Average interleaved channels into one; a trailing partial frame is dropped
fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels == 1 {
        return interleaved.to_vec();
    }

    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};
    use std::io::Cursor;

    fn encode_i16(samples: &[i16], channels: u16, sample_rate: u32) -> Vec<u8> {
        let spec = WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_decode_mono_i16_scales_to_unit_range() {
        let bytes = encode_i16(&[0, 16384, -32768, 32767], 1, 8000);
        let decoded = decode_wav_bytes(&bytes).unwrap();
        assert_eq!(decoded.sample_rate, 8000);
        assert_eq!(decoded.channels, 1);
        assert_eq!(decoded.samples[0], 0.0);
        assert!((decoded.samples[1] - 0.5).abs() < 1e-6);
        assert_eq!(decoded.samples[2], -1.0);
        assert!(decoded.samples[3] < 1.0);
    }

    #[test]
    fn test_decode_stereo_averages_channels() {
        let bytes = encode_i16(&[16384, 0, -16384, -16384], 2, 16000);
        let decoded = decode_wav_bytes(&bytes).unwrap();
        assert_eq!(decoded.samples.len(), 2);
        assert!((decoded.samples[0] - 0.25).abs() < 1e-6);
        assert!((decoded.samples[1] + 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_decode_float_passthrough() {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 22050,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
            for s in [0.125_f32, -0.75, 0.5] {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        let decoded = decode_wav_bytes(cursor.get_ref()).unwrap();
        assert_eq!(decoded.samples, vec![0.125, -0.75, 0.5]);
    }

    #[test]
    fn test_decode_empty_clip() {
        let bytes = encode_i16(&[], 1, 8000);
        assert_eq!(decode_wav_bytes(&bytes), Err(AudioError::NoSamples));
    }

    #[test]
    fn test_decode_garbage_bytes() {
        let err = decode_wav_bytes(b"definitely not a wav file").unwrap_err();
        assert!(matches!(err, AudioError::DecodeFailed { .. }));
    }

    #[test]
    fn test_decode_missing_file_names_path() {
        let err = decode_wav_file("/nonexistent/clip.wav").unwrap_err();
        match err {
            AudioError::DecodeFailed { reason } => assert!(reason.contains("clip.wav")),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
