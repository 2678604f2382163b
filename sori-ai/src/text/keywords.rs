//! Keyword-count text affect (fallback)
//!
//! Counts which entries of two fixed keyword lists occur in the text (each
//! keyword counts once) and derives tone, stress, energy and mood from the
//! difference. Used whenever the language model is unavailable or its reply
//! cannot be used.

use crate::text::TextAffectRequest;
use crate::types::{clamp_mood, Emotion, Fallback, TextAffect, Tone};

pub const POSITIVE_KEYWORDS: [&str; 10] = [
    "좋", "행복", "뿌듯", "기쁨", "즐겁", "평온", "만족", "감사", "성공", "좋아",
];

pub const NEGATIVE_KEYWORDS: [&str; 10] = [
    "힘들", "불안", "걱정", "짜증", "화", "우울", "슬픔", "스트레스", "피곤", "어려",
];

/// Confidence reported for keyword estimates
pub const KEYWORD_CONFIDENCE: f64 = 0.55;

/// Number of keywords from `list` present in `text`
pub fn count_keywords(text: &str, list: &[&str]) -> usize {
    list.iter().filter(|k| text.contains(*k)).count()
}

/// Keyword-based fallback analyzer
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordTextAffect;

impl KeywordTextAffect {
    pub fn analyze(&self, text: &str) -> TextAffect {
        let lowered = text.to_lowercase();
        let pos = count_keywords(&lowered, &POSITIVE_KEYWORDS) as i32;
        let neg = count_keywords(&lowered, &NEGATIVE_KEYWORDS) as i32;

        let (tone, stress, energy, emotion) = if pos > neg {
            (Tone::Positive, (40 - 8 * pos).max(10), (50 + 10 * pos).min(85), Emotion::Joy)
        } else if neg > pos {
            (Tone::Negative, (40 + 10 * neg).min(85), (55 - 8 * neg).max(20), Emotion::Sadness)
        } else {
            (Tone::Neutral, 30, 50, Emotion::Neutral)
        };

        TextAffect {
            emotions: vec![emotion],
            stress,
            energy,
            mood: clamp_mood((energy - stress) as f64),
            tone,
            confidence: KEYWORD_CONFIDENCE,
            summary: format!("{} 상태로 보입니다.", tone.label()),
            keywords: Vec::new(),
        }
    }
}

impl Fallback for KeywordTextAffect {
    type Input = TextAffectRequest;
    type Output = TextAffect;

    fn name(&self) -> &'static str {
        "keywords"
    }

    fn produce(&self, input: &TextAffectRequest) -> TextAffect {
        self.analyze(&input.text)
    }
}
