//! Retrieval query derivation
//!
//! Picks self-care topics from the fused affect and appends the start of the
//! entry text, so retrieval favours actionable passages over passages that
//! merely restate the entry.

use crate::types::{CombinedAffect, Tone, VoiceCues};

const STRESS_TOPICS: [&str; 4] = ["스트레스 완화", "호흡", "점진적 근육 이완", "마음챙김"];
const LOW_ENERGY_TOPICS: [&str; 4] = ["저활력 개선", "햇빛 산책", "짧은 휴식", "포모도로"];
const SLEEP_TOPICS: [&str; 2] = ["수면 위생", "취침 전 루틴"];
const POSITIVE_TOPICS: [&str; 2] = ["긍정 심리", "감사 일기"];
const SLEEP_WORDS: [&str; 3] = ["잠", "수면", "피곤"];

const DEFAULT_TOPICS: &str = "마음챙김 스트레스 완화 회복 긍정 수면 휴식";

/// Characters of the entry text carried into the query
pub const QUERY_TEXT_CHARS: usize = 400;

/// Build the retrieval query for one entry
pub fn derive_action_query(text: &str, combined: &CombinedAffect) -> String {
    let affect = &combined.affect;
    let cues = combined.cues().copied().unwrap_or_default();
    let VoiceCues {
        tension, stability, ..
    } = cues;

    let mut topics: Vec<&str> = Vec::new();
    if affect.stress >= 60 || tension >= 60.0 {
        topics.extend(STRESS_TOPICS);
    }
    if affect.energy <= 40 || stability <= 45.0 {
        topics.extend(LOW_ENERGY_TOPICS);
    }
    if SLEEP_WORDS.iter().any(|w| text.contains(w)) {
        topics.extend(SLEEP_TOPICS);
    }
    if affect.tone == Tone::Positive {
        topics.extend(POSITIVE_TOPICS);
    }

    let mut unique: Vec<&str> = Vec::with_capacity(topics.len());
    for topic in topics {
        if !unique.contains(&topic) {
            unique.push(topic);
        }
    }

    let base = if unique.is_empty() {
        DEFAULT_TOPICS.to_string()
    } else {
        unique.join(" ")
    };
    let excerpt: String = text.chars().take(QUERY_TEXT_CHARS).collect();
    format!("{}\n사용자 내용: {}", base, excerpt)
}
