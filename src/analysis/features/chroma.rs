// Chroma module - STFT chromagram with per-clip tuning estimation
//
// Power spectrum bins are mapped onto the 12 pitch classes with Gaussian
// weights centred on each semitone. Before building the weights, the clip's
// deviation from A440 equal temperament is estimated from interpolated
// spectral peaks, so a slightly detuned recording still lands on the right
// pitch classes. Each output frame is scaled so its strongest class is 1.
//
// References:
// - Ellis, D. (2007). Chroma feature analysis and synthesis
// - Müller, M. (2015). Fundamentals of Music Processing, ch. 3

use super::fft::fft_frequencies;
use super::params::{
    CHROMA_CENTER_OCTAVE, CHROMA_OCTAVE_WIDTH, NORM_THRESHOLD, TUNING_FMAX_HZ, TUNING_FMIN_HZ,
    TUNING_PEAK_THRESHOLD, TUNING_RESOLUTION,
};
use super::types::FeatureMatrix;

/// Octaves above A0/16-relative C, shifted by `tuning` fractions of a bin
fn hz_to_octs(hz: f64, tuning: f64, bins_per_octave: usize) -> f64 {
    let a440 = 440.0 * 2.0_f64.powf(tuning / bins_per_octave as f64);
    (hz / (a440 / 16.0)).log2()
}

/// Median of a non-empty slice (mean of the middle pair for even lengths)
fn median(values: &mut [f64]) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// Interpolated spectral peaks `(frequency_hz, magnitude)` used for tuning
///
/// A bin qualifies when it lies in `[TUNING_FMIN_HZ, min(TUNING_FMAX_HZ, nyquist))`,
/// exceeds `TUNING_PEAK_THRESHOLD` of its frame maximum and is a local maximum.
/// Frequency and magnitude are refined with a parabola through the bin and
/// its neighbours.
fn spectral_peaks(power_frames: &[Vec<f64>], sample_rate: u32, n_fft: usize) -> Vec<(f64, f64)> {
    let freqs = fft_frequencies(sample_rate, n_fft);
    let fmax = TUNING_FMAX_HZ.min(sample_rate as f64 / 2.0);
    let mut peaks = Vec::new();

    for frame in power_frames {
        let n = frame.len();
        if n < 3 {
            continue;
        }
        let frame_max = frame.iter().copied().fold(0.0_f64, f64::max);
        let reference = TUNING_PEAK_THRESHOLD * frame_max;
        let gated = |k: usize| if frame[k] > reference { frame[k] } else { 0.0 };

        for k in 1..n - 1 {
            if freqs[k] < TUNING_FMIN_HZ || freqs[k] >= fmax {
                continue;
            }
            let (prev, cur, next) = (gated(k - 1), gated(k), gated(k + 1));
            if !(cur > prev && cur >= next) {
                continue;
            }

            let avg = 0.5 * (frame[k + 1] - frame[k - 1]);
            let mut curvature = 2.0 * frame[k] - frame[k + 1] - frame[k - 1];
            if curvature.abs() < f64::MIN_POSITIVE {
                curvature += 1.0;
            }
            let shift = avg / curvature;

            let pitch = (k as f64 + shift) * sample_rate as f64 / n_fft as f64;
            let magnitude = frame[k] + 0.5 * avg * shift;
            peaks.push((pitch, magnitude));
        }
    }

    peaks
}

/// Deviation of a set of frequencies from equal temperament, in bins
///
/// Returns the left edge of the most populated histogram cell over
/// `[-0.5, 0.5)` at `TUNING_RESOLUTION`; 0.0 when there is nothing to measure.
pub fn pitch_tuning(frequencies: &[f64], bins_per_octave: usize) -> f64 {
    let n_cells = (1.0 / TUNING_RESOLUTION).ceil() as usize;
    let edge = |i: usize| -0.5 + i as f64 * (1.0 / n_cells as f64);
    let mut counts = vec![0_usize; n_cells];
    let mut any = false;

    for &hz in frequencies.iter().filter(|&&hz| hz > 0.0) {
        any = true;
        let mut residual = (bins_per_octave as f64 * hz_to_octs(hz, 0.0, bins_per_octave)).rem_euclid(1.0);
        if residual >= 0.5 {
            residual -= 1.0;
        }

        let mut cell = (((residual + 0.5) * n_cells as f64).floor() as isize)
            .clamp(0, n_cells as isize - 1) as usize;
        if residual < edge(cell) && cell > 0 {
            cell -= 1;
        } else if cell + 1 < n_cells && residual >= edge(cell + 1) {
            cell += 1;
        }
        counts[cell] += 1;
    }

    if !any {
        return 0.0;
    }

    // First maximum wins on ties
    let best = counts
        .iter()
        .enumerate()
        .fold((0, 0), |best, (i, &c)| if c > best.1 { (i, c) } else { best });
    edge(best.0)
}

/// Estimate the clip's tuning offset from a power spectrogram
///
/// Only peaks at least as strong as the median peak vote.
pub fn estimate_tuning(
    power_frames: &[Vec<f64>],
    sample_rate: u32,
    n_fft: usize,
    bins_per_octave: usize,
) -> f64 {
    let peaks = spectral_peaks(power_frames, sample_rate, n_fft);
    let voiced: Vec<(f64, f64)> = peaks.into_iter().filter(|&(pitch, _)| pitch > 0.0).collect();
    if voiced.is_empty() {
        return 0.0;
    }

    let mut magnitudes: Vec<f64> = voiced.iter().map(|&(_, mag)| mag).collect();
    let threshold = median(&mut magnitudes);
    let strong: Vec<f64> = voiced
        .iter()
        .filter(|&&(_, mag)| mag >= threshold)
        .map(|&(pitch, _)| pitch)
        .collect();

    pitch_tuning(&strong, bins_per_octave)
}

/// Chroma weights: `n_chroma` rows over the `n_fft / 2 + 1` FFT bins
#[derive(Debug, Clone)]
pub struct ChromaFilterbank {
    weights: Vec<Vec<f64>>,
}

impl ChromaFilterbank {
    pub fn new(sample_rate: u32, n_fft: usize, n_chroma: usize, tuning: f64) -> Self {
        let nc = n_chroma as f64;

        // Fractional chroma bin of every FFT bin; DC gets a value 1.5 octaves below bin 1
        let mut frq_bins = Vec::with_capacity(n_fft);
        for k in 1..n_fft {
            let hz = k as f64 * sample_rate as f64 / n_fft as f64;
            frq_bins.push(nc * hz_to_octs(hz, tuning, n_chroma));
        }
        frq_bins.insert(0, frq_bins[0] - 1.5 * nc);

        let mut bin_widths: Vec<f64> = frq_bins.windows(2).map(|w| (w[1] - w[0]).max(1.0)).collect();
        bin_widths.push(1.0);

        let half_chroma = (nc / 2.0).round();
        let mut weights = vec![vec![0.0; n_fft]; n_chroma];
        for (c, row) in weights.iter_mut().enumerate() {
            for (k, w) in row.iter_mut().enumerate() {
                let distance =
                    (frq_bins[k] - c as f64 + half_chroma + 10.0 * nc).rem_euclid(nc) - half_chroma;
                let z = 2.0 * distance / bin_widths[k];
                *w = (-0.5 * z * z).exp();
            }
        }

        // L2-normalize each FFT bin across the chroma classes, then apply the
        // Gaussian octave emphasis
        for k in 0..n_fft {
            let norm = weights.iter().map(|row| row[k] * row[k]).sum::<f64>().sqrt();
            let octave = (frq_bins[k] / nc - CHROMA_CENTER_OCTAVE) / CHROMA_OCTAVE_WIDTH;
            let emphasis = (-0.5 * octave * octave).exp();
            let divisor = if norm < NORM_THRESHOLD { 1.0 } else { norm };
            for row in weights.iter_mut() {
                row[k] = row[k] / divisor * emphasis;
            }
        }

        // Rotate so row 0 is C rather than A, and keep the non-negative frequencies
        let shift = 3 * (n_chroma / 12);
        let n_bins = n_fft / 2 + 1;
        let weights = (0..n_chroma)
            .map(|c| weights[(c + shift) % n_chroma][..n_bins].to_vec())
            .collect();

        Self { weights }
    }

    pub fn n_chroma(&self) -> usize {
        self.weights.len()
    }

    /// Chromagram of power frames, each frame scaled to a maximum of 1
    pub fn apply(&self, power_frames: &[Vec<f64>]) -> FeatureMatrix {
        let mut chroma = FeatureMatrix::zeros(self.weights.len(), power_frames.len());
        let mut column = vec![0.0; self.weights.len()];

        for (t, frame) in power_frames.iter().enumerate() {
            for (c, row) in self.weights.iter().enumerate() {
                column[c] = row.iter().zip(frame).map(|(w, p)| w * p).sum();
            }

            let peak = column.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
            let divisor = if peak < NORM_THRESHOLD { 1.0 } else { peak };
            for (c, &v) in column.iter().enumerate() {
                chroma.set(c, t, v / divisor);
            }
        }

        chroma
    }
}

/// Chromagram with tuning estimated from the same power spectrogram
pub fn chromagram(power_frames: &[Vec<f64>], sample_rate: u32, n_fft: usize, n_chroma: usize) -> FeatureMatrix {
    let tuning = estimate_tuning(power_frames, sample_rate, n_fft, n_chroma);
    tracing::debug!("[Chroma] estimated tuning offset {:+.2} bins", tuning);
    ChromaFilterbank::new(sample_rate, n_fft, n_chroma, tuning).apply(power_frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::features::fft::StftProcessor;

    fn sine(freq: f64, sample_rate: u32, seconds: f64) -> Vec<f32> {
        let n = (sample_rate as f64 * seconds) as usize;
        (0..n)
            .map(|i| (2.0 * std::f64::consts::PI * freq * i as f64 / sample_rate as f64).sin() as f32)
            .collect()
    }

    #[test]
    fn test_pitch_tuning_in_tune_frequencies() {
        assert_eq!(pitch_tuning(&[440.0, 880.0, 261.6255653], 12), 0.0);
    }

    #[test]
    fn test_pitch_tuning_detects_sharp_offset() {
        // A quarter semitone sharp
        let sharp = 440.0 * 2.0_f64.powf(0.25 / 12.0);
        let tuning = pitch_tuning(&[sharp, sharp * 2.0], 12);
        assert!((tuning - 0.25).abs() < 0.011, "tuning {}", tuning);
    }

    #[test]
    fn test_pitch_tuning_empty_is_zero() {
        assert_eq!(pitch_tuning(&[], 12), 0.0);
        assert_eq!(pitch_tuning(&[0.0, -3.0], 12), 0.0);
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&mut [4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn test_filterbank_shape_and_non_negative() {
        let bank = ChromaFilterbank::new(22050, 2048, 12, 0.0);
        assert_eq!(bank.n_chroma(), 12);
        assert!(bank.weights.iter().all(|row| row.len() == 1025));
        assert!(bank.weights.iter().flatten().all(|&w| w >= 0.0 && w.is_finite()));
    }

    #[test]
    fn test_a440_lands_on_pitch_class_a() {
        let sample_rate = 22050;
        let stft = StftProcessor::new(2048, 512);
        let power = stft.magnitude_spectrogram(&sine(440.0, sample_rate, 1.0)).power();
        let chroma = chromagram(&power, sample_rate, 2048, 12);

        let t = chroma.n_frames() / 2;
        let strongest = (0..12)
            .max_by(|&a, &b| chroma.get(a, t).partial_cmp(&chroma.get(b, t)).unwrap())
            .unwrap();
        // C = 0, so A = 9
        assert_eq!(strongest, 9);
        assert!((chroma.get(9, t) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_silence_gives_zero_chroma_and_zero_tuning() {
        let frames = vec![vec![0.0; 1025]; 4];
        assert_eq!(estimate_tuning(&frames, 22050, 2048, 12), 0.0);
        let chroma = chromagram(&frames, 22050, 2048, 12);
        assert!(chroma.values().iter().all(|&v| v == 0.0));
    }
}
