//! Per-user prosody baseline
//!
//! Running mean of five prosodic measurements, used to express a new
//! recording relative to the speaker's own typical voice. The update weight
//! is `1/n` with `n` capped at [`MAX_BASELINE_COUNT`], so the first twenty
//! recordings form a true average and later ones a moving average.

use crate::types::RawAudioFeatures;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Cap on the update count (and so the slowest adaptation rate)
pub const MAX_BASELINE_COUNT: u32 = 20;

/// Measurements tracked by the baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineField {
    PitchMean,
    Tempo,
    EnergyMean,
    Hnr,
    SpectralCentroidMean,
}

impl BaselineField {
    pub const ALL: [BaselineField; 5] = [
        BaselineField::PitchMean,
        BaselineField::Tempo,
        BaselineField::EnergyMean,
        BaselineField::Hnr,
        BaselineField::SpectralCentroidMean,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// Read this field from a feature record
    pub fn value_of(self, features: &RawAudioFeatures) -> f64 {
        match self {
            BaselineField::PitchMean => features.pitch_mean,
            BaselineField::Tempo => features.tempo,
            BaselineField::EnergyMean => features.energy_mean,
            BaselineField::Hnr => features.hnr,
            BaselineField::SpectralCentroidMean => features.spectral_centroid_mean,
        }
    }
}

/// Running-average reference for one user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaselineTracker {
    means: [f64; 5],
    count: u32,
}

impl BaselineTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of updates applied, capped at [`MAX_BASELINE_COUNT`]
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Current mean for a field, `None` before the first update
    pub fn mean(&self, field: BaselineField) -> Option<f64> {
        (self.count > 0).then(|| self.means[field.index()])
    }

    /// Fold one recording into the running means
    pub fn update(&mut self, features: &RawAudioFeatures) {
        let n = (self.count + 1).min(MAX_BASELINE_COUNT);
        let alpha = 1.0 / n as f64;

        for field in BaselineField::ALL {
            let value = field.value_of(features);
            if !value.is_finite() {
                continue;
            }
            let slot = &mut self.means[field.index()];
            // First update seeds the mean with the value itself
            let prev = if self.count == 0 { value } else { *slot };
            *slot = (1.0 - alpha) * prev + alpha * value;
        }

        self.count = n;
        debug!(count = self.count, "Updated prosody baseline");
    }

    /// `value / mean` when a non-zero mean exists, else `value`
    pub fn normalize(&self, value: f64, field: BaselineField) -> f64 {
        match self.mean(field) {
            Some(mean) if mean != 0.0 => value / mean,
            _ => value,
        }
    }

    /// Forget all history
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(pitch: f64, energy: f64) -> RawAudioFeatures {
        RawAudioFeatures {
            pitch_mean: pitch,
            energy_mean: energy,
            ..RawAudioFeatures::default()
        }
    }

    #[test]
    fn test_cold_start_passthrough() {
        let baseline = BaselineTracker::new();
        assert!(baseline.is_empty());
        assert_eq!(baseline.mean(BaselineField::Tempo), None);
        assert_eq!(baseline.normalize(0.3, BaselineField::EnergyMean), 0.3);
    }

    #[test]
    fn test_first_update_seeds_mean() {
        let mut baseline = BaselineTracker::new();
        baseline.update(&features(180.0, 0.1));
        assert_eq!(baseline.count(), 1);
        assert_eq!(baseline.mean(BaselineField::PitchMean), Some(180.0));
        assert_eq!(baseline.normalize(0.2, BaselineField::EnergyMean), 2.0);
    }

    #[test]
    fn test_running_average() {
        let mut baseline = BaselineTracker::new();
        baseline.update(&features(100.0, 0.1));
        baseline.update(&features(200.0, 0.1));
        baseline.update(&features(300.0, 0.1));
        let mean = baseline.mean(BaselineField::PitchMean).unwrap();
        assert!((mean - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_count_caps_at_twenty() {
        let mut baseline = BaselineTracker::new();
        for _ in 0..50 {
            baseline.update(&features(150.0, 0.08));
        }
        assert_eq!(baseline.count(), MAX_BASELINE_COUNT);
    }

    #[test]
    fn test_converges_to_repeated_input() {
        let mut baseline = BaselineTracker::new();
        baseline.update(&features(400.0, 0.5));
        for _ in 0..400 {
            baseline.update(&features(120.0, 0.05));
        }
        let pitch = baseline.mean(BaselineField::PitchMean).unwrap();
        let energy = baseline.mean(BaselineField::EnergyMean).unwrap();
        assert!((pitch - 120.0).abs() < 1e-3, "pitch {}", pitch);
        assert!((energy - 0.05).abs() < 1e-6, "energy {}", energy);
    }

    #[test]
    fn test_identical_input_is_fixed_point() {
        let mut baseline = BaselineTracker::new();
        for _ in 0..30 {
            baseline.update(&features(163.0, 0.09));
        }
        let pitch = baseline.mean(BaselineField::PitchMean).unwrap();
        assert!((pitch - 163.0).abs() < 1e-9);
        assert!((baseline.normalize(163.0, BaselineField::PitchMean) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_mean_passthrough() {
        let mut baseline = BaselineTracker::new();
        baseline.update(&features(150.0, 0.0));
        assert_eq!(baseline.normalize(0.07, BaselineField::EnergyMean), 0.07);
    }

    #[test]
    fn test_reset() {
        let mut baseline = BaselineTracker::new();
        baseline.update(&features(150.0, 0.1));
        baseline.reset();
        assert!(baseline.is_empty());
        assert_eq!(baseline, BaselineTracker::default());
    }
}
