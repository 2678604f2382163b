//! Prosody → voice cue mapping
//!
//! Turns raw measurements into four bounded dimensions:
//! - **arousal** rises with vocal energy, speaking rate and brightness
//! - **tension** rises with micro-instability (jitter) and frication (ZCR)
//! - **stability** rises with harmonic clarity and falls with jitter
//! - **quality** gates how much the voice channel is trusted downstream
//!
//! Energy, tempo, HNR and spectral centroid enter the formulas as the ratio
//! to the speaker's baseline mean (the raw value while no baseline exists).
//! Jitter and ZCR are used as measured.

use crate::types::{RawAudioFeatures, VoiceCues};
use crate::voice::baseline::{BaselineField, BaselineTracker};

/// Mapping coefficients
#[derive(Debug, Clone)]
pub struct DimensionParams {
    pub arousal_base: f64,
    pub arousal_energy: f64,
    pub arousal_tempo: f64,
    pub arousal_centroid: f64,
    pub tension_base: f64,
    pub tension_jitter: f64,
    pub tension_zcr: f64,
    pub stability_base: f64,
    pub stability_hnr: f64,
    pub stability_jitter: f64,
    pub quality_duration: f64,
    pub quality_hnr: f64,
    pub quality_energy: f64,
    /// Clip length that earns the full duration weight (seconds)
    pub quality_full_duration: f64,
}

impl Default for DimensionParams {
    fn default() -> Self {
        Self {
            arousal_base: 35.0,
            arousal_energy: 120.0,
            arousal_tempo: 0.06,
            arousal_centroid: 0.004,
            tension_base: 28.0,
            tension_jitter: 120.0,
            tension_zcr: 0.55,
            stability_base: 60.0,
            stability_hnr: 1.3,
            stability_jitter: 85.0,
            quality_duration: 0.28,
            quality_hnr: 0.42,
            quality_energy: 0.30,
            quality_full_duration: 8.0,
        }
    }
}

/// Pure mapping from features (and a baseline) to voice cues
#[derive(Debug, Clone, Default)]
pub struct DimensionMapper {
    params: DimensionParams,
}

impl DimensionMapper {
    pub fn new(params: DimensionParams) -> Self {
        Self { params }
    }

    /// Map one recording to voice cues; all outputs clipped into range
    pub fn map(&self, features: &RawAudioFeatures, baseline: &BaselineTracker) -> VoiceCues {
        let p = &self.params;
        let reference = RawAudioFeatures::default();

        let relative = |field: BaselineField| baseline.normalize(field.value_of(features), field);

        let energy = relative(BaselineField::EnergyMean);
        let tempo = relative(BaselineField::Tempo);
        let hnr = relative(BaselineField::Hnr);
        let centroid = relative(BaselineField::SpectralCentroidMean);
        let jitter = features.jitter;
        let zcr = features.zcr_mean;

        let arousal = p.arousal_base
            + p.arousal_energy * energy
            + p.arousal_tempo * (tempo - reference.tempo)
            + p.arousal_centroid * (centroid - reference.spectral_centroid_mean);

        let tension = p.tension_base
            + p.tension_jitter * jitter
            + p.tension_zcr * (zcr - reference.zcr_mean) * 100.0;

        let stability =
            p.stability_base + p.stability_hnr * (hnr - reference.hnr) - p.stability_jitter * jitter;

        let quality = p.quality_duration * (features.duration_sec / p.quality_full_duration)
            + p.quality_hnr * ((hnr - 10.0) / 15.0).clamp(0.0, 1.0)
            + p.quality_energy * ((energy - 0.06) / 0.20).clamp(0.0, 1.0);

        VoiceCues {
            arousal: clip(arousal, 0.0, 100.0),
            tension: clip(tension, 0.0, 100.0),
            stability: clip(stability, 0.0, 100.0),
            quality: clip(quality, 0.0, 1.0),
        }
    }
}

fn clip(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        lo
    } else {
        value.clamp(lo, hi)
    }
}
