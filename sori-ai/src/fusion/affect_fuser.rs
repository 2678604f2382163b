//! Text + voice affect fusion
//!
//! The text estimate is the anchor. Voice cues nudge stress, energy and mood
//! by a bounded amount weighted by voice quality and the text's tone; emotion
//! labels and tone are never changed by voice.
//!
//! # Algorithm
//! 1. `alpha = 0.25 * quality`, scaled by tone (positive 0.6, negative 0.9, neutral 1.0)
//! 2. Deltas from cue deviations around the 50 midpoint:
//!    - energy: `alpha * a * 12`
//!    - stress: `alpha * (t * 12 - s * 6)`
//!    - mood:   `alpha * s * 8 - alpha * t * 6`
//!
//!    where `a`, `t`, `s` are `(cue - 50) / 50` for arousal, tension, stability
//! 3. Deltas clamped (±12 stress/energy, ±10 mood), applied, rounded,
//!    re-clamped into canonical ranges
//! 4. Confidence raised by `0.12 * quality`

use crate::types::{clamp_mood, clamp_score, CombinedAffect, TextAffect, Tone, VoiceAnalysis};
use tracing::debug;

/// Fusion weights and limits
#[derive(Debug, Clone)]
pub struct FusionParams {
    pub quality_weight: f64,
    pub positive_tone_scale: f64,
    pub negative_tone_scale: f64,
    pub energy_gain: f64,
    pub stress_tension_gain: f64,
    pub stress_stability_gain: f64,
    pub mood_stability_gain: f64,
    pub mood_tension_gain: f64,
    pub max_score_delta: f64,
    pub max_mood_delta: f64,
    pub confidence_gain: f64,
}

impl Default for FusionParams {
    fn default() -> Self {
        Self {
            quality_weight: 0.25,
            positive_tone_scale: 0.6,
            negative_tone_scale: 0.9,
            energy_gain: 12.0,
            stress_tension_gain: 12.0,
            stress_stability_gain: 6.0,
            mood_stability_gain: 8.0,
            mood_tension_gain: 6.0,
            max_score_delta: 12.0,
            max_mood_delta: 10.0,
            confidence_gain: 0.12,
        }
    }
}

/// Adjustments applied to the text anchor
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AffectDelta {
    pub stress: f64,
    pub energy: f64,
    pub mood: f64,
}

/// Fuses text affect with optional voice evidence
#[derive(Debug, Clone, Default)]
pub struct FusionEngine {
    params: FusionParams,
}

impl FusionEngine {
    pub fn new(params: FusionParams) -> Self {
        Self { params }
    }

    /// Bounded adjustments for a tone and voice analysis
    pub fn delta(&self, tone: Tone, voice: &VoiceAnalysis) -> AffectDelta {
        let p = &self.params;
        let cues = &voice.cues;

        let tone_scale = match tone {
            Tone::Positive => p.positive_tone_scale,
            Tone::Negative => p.negative_tone_scale,
            Tone::Neutral => 1.0,
        };
        let alpha = p.quality_weight * cues.quality.clamp(0.0, 1.0) * tone_scale;

        let a = (cues.arousal - 50.0) / 50.0;
        let t = (cues.tension - 50.0) / 50.0;
        let s = (cues.stability - 50.0) / 50.0;

        let energy = alpha * a * p.energy_gain;
        let stress = alpha * (t * p.stress_tension_gain - s * p.stress_stability_gain);
        let mood = alpha * s * p.mood_stability_gain - alpha * t * p.mood_tension_gain;

        AffectDelta {
            stress: bound(stress, p.max_score_delta),
            energy: bound(energy, p.max_score_delta),
            mood: bound(mood, p.max_mood_delta),
        }
    }

    /// Combine text affect with optional voice evidence; pure
    pub fn combine(&self, text: &TextAffect, voice: Option<&VoiceAnalysis>) -> CombinedAffect {
        let Some(voice) = voice else {
            return CombinedAffect {
                affect: text.clone(),
                voice: None,
            };
        };

        let delta = self.delta(text.tone, voice);
        let quality = voice.cues.quality.clamp(0.0, 1.0);

        let affect = TextAffect {
            stress: clamp_score(text.stress as f64 + delta.stress),
            energy: clamp_score(text.energy as f64 + delta.energy),
            mood: clamp_mood(text.mood as f64 + delta.mood),
            confidence: (text.confidence + self.params.confidence_gain * quality).clamp(0.0, 1.0),
            ..text.clone()
        };

        debug!(
            quality,
            stress_delta = delta.stress,
            energy_delta = delta.energy,
            mood_delta = delta.mood,
            "Fused voice cues into text affect"
        );

        CombinedAffect {
            affect,
            voice: Some(voice.clone()),
        }
    }
}

fn bound(value: f64, limit: f64) -> f64 {
    if value.is_finite() {
        value.clamp(-limit, limit)
    } else {
        0.0
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Emotion, RawAudioFeatures, VoiceCues};

    fn text(tone: Tone, stress: i32, energy: i32, mood: i32) -> TextAffect {
        TextAffect {
            emotions: vec![Emotion::Anxiety, Emotion::Fatigue],
            stress,
            energy,
            mood,
            tone,
            confidence: 0.7,
            summary: "요약".to_string(),
            keywords: vec!["회의".to_string()],
        }
    }

    fn voice(arousal: f64, tension: f64, stability: f64, quality: f64) -> VoiceAnalysis {
        VoiceAnalysis {
            features: RawAudioFeatures::default(),
            cues: VoiceCues {
                arousal,
                tension,
                stability,
                quality,
            },
        }
    }

    #[test]
    fn test_no_voice_is_identity() {
        let engine = FusionEngine::default();
        let anchor = text(Tone::Negative, 66, 34, -20);
        let combined = engine.combine(&anchor, None);
        assert_eq!(combined.affect, anchor);
        assert!(combined.voice.is_none());
    }

    #[test]
    fn test_zero_quality_changes_nothing() {
        let engine = FusionEngine::default();
        let anchor = text(Tone::Neutral, 45, 55, 10);
        let combined = engine.combine(&anchor, Some(&voice(100.0, 100.0, 0.0, 0.0)));
        assert_eq!(combined.affect, anchor);
        assert!(combined.voice.is_some());
    }

    #[test]
    fn test_tense_voice_raises_stress() {
        let engine = FusionEngine::default();
        let anchor = text(Tone::Neutral, 40, 50, 0);
        let combined = engine.combine(&anchor, Some(&voice(50.0, 100.0, 0.0, 1.0)));

        // alpha 0.25; stress delta 0.25 * (12 + 6) = 4.5
        assert_eq!(combined.affect.stress, 45);
        // mood delta 0.25 * (-8) - 0.25 * 6 = -3.5
        assert_eq!(combined.affect.mood, -4);
        assert_eq!(combined.affect.energy, 50);
        assert!((combined.affect.confidence - 0.82).abs() < 1e-9);
    }

    #[test]
    fn test_positive_tone_trusts_voice_less() {
        let engine = FusionEngine::default();
        let cues = voice(100.0, 50.0, 50.0, 1.0);
        let positive = engine.delta(Tone::Positive, &cues);
        let negative = engine.delta(Tone::Negative, &cues);
        let neutral = engine.delta(Tone::Neutral, &cues);
        assert!((neutral.energy - 3.0).abs() < 1e-9);
        assert!((negative.energy - 2.7).abs() < 1e-9);
        assert!((positive.energy - 1.8).abs() < 1e-9);
    }

    #[test]
    fn test_labels_and_tone_never_change() {
        let engine = FusionEngine::default();
        let anchor = text(Tone::Positive, 20, 80, 50);
        let combined = engine.combine(&anchor, Some(&voice(0.0, 100.0, 0.0, 1.0)));
        assert_eq!(combined.affect.emotions, anchor.emotions);
        assert_eq!(combined.affect.tone, anchor.tone);
        assert_eq!(combined.affect.summary, anchor.summary);
        assert_eq!(combined.affect.keywords, anchor.keywords);
    }

    #[test]
    fn test_deltas_bounded_across_grid() {
        let engine = FusionEngine::default();
        let steps = [0.0, 12.5, 50.0, 77.0, 100.0];
        let anchors = [
            text(Tone::Positive, 0, 100, 70),
            text(Tone::Neutral, 50, 50, 0),
            text(Tone::Negative, 100, 0, -70),
        ];

        for anchor in &anchors {
            for &a in &steps {
                for &t in &steps {
                    for &s in &steps {
                        for &q in &[0.0, 0.3, 1.0] {
                            let combined = engine.combine(anchor, Some(&voice(a, t, s, q)));
                            let out = &combined.affect;
                            assert!((out.stress - anchor.stress).abs() <= 12);
                            assert!((out.energy - anchor.energy).abs() <= 12);
                            assert!((out.mood - anchor.mood).abs() <= 10);
                            assert!((0..=100).contains(&out.stress));
                            assert!((0..=100).contains(&out.energy));
                            assert!((-70..=70).contains(&out.mood));
                            assert!((0.0..=1.0).contains(&out.confidence));
                            assert_eq!(out.emotions, anchor.emotions);
                        }
                    }
                }
            }
        }
    }
}
