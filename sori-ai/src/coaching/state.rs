//! Mental state classification
//!
//! A fixed priority list over the fused scores; the first matching rule wins.

use crate::types::TextAffect;
use serde::{Deserialize, Serialize};

/// Coarse wellbeing state of one entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MentalState {
    #[serde(rename = "고스트레스")]
    HighStress,
    #[serde(rename = "긴장 과다")]
    OverTension,
    #[serde(rename = "저활력")]
    LowVitality,
    #[serde(rename = "저각성")]
    LowArousal,
    #[serde(rename = "과흥분/과부하 가능")]
    PossibleOverload,
    #[serde(rename = "안정/회복")]
    StableRecovering,
    #[default]
    #[serde(rename = "중립")]
    Neutral,
}

impl MentalState {
    pub fn label(&self) -> &'static str {
        match self {
            MentalState::HighStress => "고스트레스",
            MentalState::OverTension => "긴장 과다",
            MentalState::LowVitality => "저활력",
            MentalState::LowArousal => "저각성",
            MentalState::PossibleOverload => "과흥분/과부하 가능",
            MentalState::StableRecovering => "안정/회복",
            MentalState::Neutral => "중립",
        }
    }

    /// Classify fused scores
    ///
    /// Priority: high stress (≥ 80), over-tension (≥ 60), low vitality
    /// (energy < 30), low arousal (energy < 40, mood < -10), possible overload
    /// (stress > 60, energy > 70), stable/recovering (mood ≥ 20, stress < 40),
    /// neutral. The overload rule sits behind over-tension and never fires
    /// with these thresholds.
    pub fn classify(affect: &TextAffect) -> MentalState {
        let (stress, energy, mood) = (affect.stress, affect.energy, affect.mood);

        if stress >= 80 {
            MentalState::HighStress
        } else if stress >= 60 {
            MentalState::OverTension
        } else if energy < 30 {
            MentalState::LowVitality
        } else if energy < 40 && mood < -10 {
            MentalState::LowArousal
        } else if stress > 60 && energy > 70 {
            MentalState::PossibleOverload
        } else if mood >= 20 && stress < 40 {
            MentalState::StableRecovering
        } else {
            MentalState::Neutral
        }
    }
}

/// Keyword stems mapped to positive event tags
const POSITIVE_EVENT_TAGS: [(&str, &str); 9] = [
    ("좋았", "오늘 좋았던 점"),
    ("행복", "행복한 순간"),
    ("고마", "감사한 일"),
    ("즐겁", "즐거웠던 활동"),
    ("평온", "평온했던 순간"),
    ("성공", "성취"),
    ("뿌듯", "뿌듯했던 일"),
    ("만족", "만족스러운 일"),
    ("친구", "친구들과의 시간"),
];

/// Maximum positive tags per entry
pub const MAX_POSITIVES: usize = 4;

/// Positive event tags found in the text, in table order, at most four
pub fn positive_events(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut tags: Vec<String> = Vec::new();
    for (stem, tag) in POSITIVE_EVENT_TAGS {
        if lowered.contains(stem) && !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags.truncate(MAX_POSITIVES);
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Tone;

    fn affect(stress: i32, energy: i32, mood: i32) -> TextAffect {
        TextAffect {
            emotions: Vec::new(),
            stress,
            energy,
            mood,
            tone: Tone::Neutral,
            confidence: 0.7,
            summary: String::new(),
            keywords: Vec::new(),
        }
    }

    #[test]
    fn test_priority_order() {
        assert_eq!(MentalState::classify(&affect(85, 20, -40)), MentalState::HighStress);
        assert_eq!(MentalState::classify(&affect(60, 90, 0)), MentalState::OverTension);
        assert_eq!(MentalState::classify(&affect(50, 29, -50)), MentalState::LowVitality);
        assert_eq!(MentalState::classify(&affect(50, 35, -11)), MentalState::LowArousal);
        assert_eq!(MentalState::classify(&affect(50, 35, -10)), MentalState::Neutral);
        assert_eq!(MentalState::classify(&affect(39, 60, 20)), MentalState::StableRecovering);
        assert_eq!(MentalState::classify(&affect(40, 60, 20)), MentalState::Neutral);
    }

    #[test]
    fn test_boundaries() {
        assert_eq!(MentalState::classify(&affect(79, 50, 0)), MentalState::OverTension);
        assert_eq!(MentalState::classify(&affect(80, 50, 0)), MentalState::HighStress);
        assert_eq!(MentalState::classify(&affect(59, 30, 0)), MentalState::Neutral);
    }

    #[test]
    fn test_labels_serialize_in_korean() {
        assert_eq!(
            serde_json::to_string(&MentalState::StableRecovering).unwrap(),
            "\"안정/회복\""
        );
        assert_eq!(MentalState::default().label(), "중립");
    }

    #[test]
    fn test_positive_events() {
        assert_eq!(
            positive_events("친구랑 즐겁게 놀아서 행복했고 좋았어요. 정말 행복!"),
            vec!["오늘 좋았던 점", "행복한 순간", "즐거웠던 활동", "친구들과의 시간"]
        );
        assert!(positive_events("그냥 그런 하루").is_empty());
    }

    #[test]
    fn test_positive_events_capped() {
        let tags = positive_events("좋았 행복 고마 즐겁 평온 성공");
        assert_eq!(tags.len(), MAX_POSITIVES);
    }
}
