//! Frame-level signal measurements
//!
//! Plain DSP over mono f32 samples. Frames are not centered: a signal shorter
//! than one frame is treated as a single zero-padded frame.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use std::f64::consts::PI;

/// Start offsets of analysis frames
fn frame_starts(len: usize, frame: usize, hop: usize) -> Vec<usize> {
    if len == 0 || frame == 0 || hop == 0 {
        return Vec::new();
    }
    if len <= frame {
        return vec![0];
    }
    (0..=len - frame).step_by(hop).collect()
}

/// Frame-wise root mean square
pub fn frame_rms(samples: &[f32], frame: usize, hop: usize) -> Vec<f64> {
    frame_starts(samples.len(), frame, hop)
        .into_iter()
        .map(|start| {
            let end = (start + frame).min(samples.len());
            let energy: f64 = samples[start..end].iter().map(|&s| (s as f64) * (s as f64)).sum();
            (energy / frame as f64).sqrt()
        })
        .collect()
}

/// Frame-wise zero-crossing rate (crossings per sample, 0-1)
pub fn zero_crossing_rate(samples: &[f32], frame: usize, hop: usize) -> Vec<f64> {
    frame_starts(samples.len(), frame, hop)
        .into_iter()
        .map(|start| {
            let end = (start + frame).min(samples.len());
            let crossings = samples[start..end]
                .windows(2)
                .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
                .count();
            crossings as f64 / frame as f64
        })
        .collect()
}

/// Magnitude spectrogram (Hann window, one-sided)
#[derive(Debug, Clone)]
pub struct Spectrogram {
    /// Magnitudes per frame, `n_fft / 2 + 1` bins each
    pub frames: Vec<Vec<f64>>,
    /// Width of one frequency bin (Hz)
    pub bin_hz: f64,
    /// Frames per second
    pub frame_rate: f64,
}

impl Spectrogram {
    pub fn compute(samples: &[f32], sample_rate: u32, n_fft: usize, hop: usize) -> Self {
        let bins = n_fft / 2 + 1;
        let window: Vec<f64> = (0..n_fft)
            .map(|n| 0.5 - 0.5 * (2.0 * PI * n as f64 / n_fft as f64).cos())
            .collect();

        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(n_fft);
        let mut buffer = vec![Complex::new(0.0, 0.0); n_fft];

        let frames = frame_starts(samples.len(), n_fft, hop)
            .into_iter()
            .map(|start| {
                for (i, slot) in buffer.iter_mut().enumerate() {
                    let sample = samples.get(start + i).copied().unwrap_or(0.0) as f64;
                    *slot = Complex::new(sample * window[i], 0.0);
                }
                fft.process(&mut buffer);
                buffer[..bins].iter().map(|c| c.norm()).collect()
            })
            .collect();

        Self {
            frames,
            bin_hz: sample_rate as f64 / n_fft as f64,
            frame_rate: sample_rate as f64 / hop as f64,
        }
    }
}

/// Frame-wise spectral centroid (Hz); silent frames yield 0
pub fn spectral_centroid(spec: &Spectrogram) -> Vec<f64> {
    spec.frames
        .iter()
        .map(|mags| {
            let total: f64 = mags.iter().sum();
            if total <= f64::EPSILON {
                return 0.0;
            }
            let weighted: f64 = mags
                .iter()
                .enumerate()
                .map(|(bin, &m)| bin as f64 * spec.bin_hz * m)
                .sum();
            weighted / total
        })
        .collect()
}

/// Per-frame dominant pitch within `[fmin, fmax)`
///
/// For each frame the strongest local spectral peak in band whose magnitude
/// exceeds `threshold` times the frame maximum is refined by parabolic
/// interpolation. Frames without such a peak are omitted.
pub fn pitch_track(spec: &Spectrogram, fmin: f64, fmax: f64, threshold: f64) -> Vec<f64> {
    spec.frames
        .iter()
        .filter_map(|mags| {
            let frame_max = mags.iter().cloned().fold(0.0f64, f64::max);
            if frame_max <= f64::EPSILON {
                return None;
            }
            let floor = threshold * frame_max;

            let mut best: Option<(usize, f64)> = None;
            for bin in 1..mags.len().saturating_sub(1) {
                let freq = bin as f64 * spec.bin_hz;
                if freq < fmin || freq >= fmax {
                    continue;
                }
                let (prev, cur, next) = (mags[bin - 1], mags[bin], mags[bin + 1]);
                if cur > prev && cur >= next && cur > floor {
                    if best.map_or(true, |(_, m)| cur > m) {
                        best = Some((bin, cur));
                    }
                }
            }

            let (bin, cur) = best?;
            let (prev, next) = (mags[bin - 1], mags[bin + 1]);
            let denom = prev - 2.0 * cur + next;
            let shift = if denom.abs() > f64::EPSILON {
                0.5 * (prev - next) / denom
            } else {
                0.0
            };
            let pitch = (bin as f64 + shift) * spec.bin_hz;
            (pitch > 0.0).then_some(pitch)
        })
        .collect()
}

/// Onset strength: half-wave rectified log-magnitude spectral flux
pub fn onset_envelope(spec: &Spectrogram) -> Vec<f64> {
    let log_frames: Vec<Vec<f64>> = spec
        .frames
        .iter()
        .map(|mags| mags.iter().map(|&m| (1.0 + 100.0 * m).ln()).collect())
        .collect();

    log_frames
        .windows(2)
        .map(|pair| {
            let rise: f64 = pair[1]
                .iter()
                .zip(&pair[0])
                .map(|(cur, prev)| (cur - prev).max(0.0))
                .sum();
            rise / pair[1].len().max(1) as f64
        })
        .collect()
}

/// Tempo estimate (BPM) from an onset envelope
///
/// Autocorrelation over lags covering 30-240 BPM, weighted by a log-normal
/// prior centered on 120 BPM with a one-octave deviation. Returns `None` for
/// a flat or too-short envelope.
pub fn estimate_tempo(envelope: &[f64], frame_rate: f64) -> Option<f64> {
    const MIN_BPM: f64 = 30.0;
    const MAX_BPM: f64 = 240.0;
    const PRIOR_BPM: f64 = 120.0;

    if envelope.len() < 4 || frame_rate <= 0.0 {
        return None;
    }

    let min_lag = ((60.0 * frame_rate / MAX_BPM).floor() as usize).max(1);
    let max_lag = ((60.0 * frame_rate / MIN_BPM).ceil() as usize).min(envelope.len() - 2);
    if min_lag > max_lag {
        return None;
    }

    let mut best: Option<(f64, f64)> = None;
    for lag in min_lag..=max_lag {
        let overlap = envelope.len() - lag;
        let ac: f64 = envelope[..overlap]
            .iter()
            .zip(&envelope[lag..])
            .map(|(a, b)| a * b)
            .sum::<f64>()
            / overlap as f64;
        if ac <= 0.0 {
            continue;
        }
        let bpm = 60.0 * frame_rate / lag as f64;
        let octaves = (bpm / PRIOR_BPM).log2();
        let score = ac * (-0.5 * octaves * octaves).exp();
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((bpm, score));
        }
    }

    best.map(|(bpm, _)| bpm)
}

/// Mean of a slice, `None` when empty
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Population standard deviation, `None` when empty
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}
