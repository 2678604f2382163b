//! Coaching Composer
//!
//! Turns the fused affect, retrieved knowledge and recent history into a
//! [`CoachingRecord`]. The language model writes the primary record and must
//! ground its recommendations in the labelled knowledge chunks (`[S1]`, ...);
//! the rule table answers any failure. The mental state is always the
//! deterministic classification, whichever path produced the text.

use crate::coaching::state::{positive_events, MentalState, MAX_POSITIVES};
use crate::coaching::{Citation, CoachingRecord, HistoryPoint, MAX_CITATIONS, MAX_RECOMMENDATIONS};
use crate::knowledge::ChunkMatch;
use crate::services::{ChatRequest, LanguageModelClient};
use crate::types::{
    AnalysisFailure, CombinedAffect, Fallback, OrElse, Strategy, StrategyExt, Tone, VoiceCues,
};
use crate::utils::parse_typed;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

const SYSTEM_PROMPT: &str = concat!(
    "당신은 따뜻한 한국어 웰빙 코치입니다. ",
    "감정 라벨은 텍스트 분석이 기준이며, 음성은 각성/긴장/안정의 보조지표로만 고려하세요. ",
    "아래 지식베이스 조각([S1], [S2] ...)만을 근거로 행동 추천/미시조정 팁을 최대 4개 제시하고, ",
    "근거로 사용한 조각의 라벨을 citations에 적으세요. ",
    "의료적 진단/치료는 하지 마세요. 다음 JSON 형식으로만 답하세요: ",
    r#"{"summary": "요약", "positives": ["긍정요소"], "recommendations": ["추천사항"], "#,
    r#""motivation": "격려메시지", "citations": ["S1"]}"#
);

const DEFAULT_SUMMARY: &str = "오늘의 상태를 차분히 정리했어요.";
const DEFAULT_MOTIVATION: &str = "작은 걸음이 큰 변화를 만듭니다.";

/// History entries shown to the model
pub const HISTORY_WINDOW: usize = 5;

/// Grounded tips appended by the rule fallback
pub const MAX_GROUNDED_TIPS: usize = 2;

/// Characters kept from a chunk's opening line
pub const TIP_MAX_CHARS: usize = 120;

static INLINE_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(S\d+)\]").expect("Invalid regex"));

/// Everything the composer looks at for one entry
#[derive(Debug, Clone)]
pub struct CoachingRequest {
    pub text: String,
    pub combined: CombinedAffect,
    pub retrieved: Vec<ChunkMatch>,
    pub history: Vec<HistoryPoint>,
}

impl CoachingRequest {
    fn state(&self) -> MentalState {
        MentalState::classify(&self.combined.affect)
    }

    fn cues(&self) -> VoiceCues {
        self.combined.cues().copied().unwrap_or_default()
    }

    /// Citation for a supplied chunk label (`S1` is the first chunk)
    fn citation(&self, label: &str) -> Option<Citation> {
        let index: usize = label.strip_prefix('S')?.parse().ok()?;
        let chunk = self.retrieved.get(index.checked_sub(1)?)?;
        Some(Citation {
            label: label.to_string(),
            source: chunk.source.clone(),
            page: chunk.page,
        })
    }
}

/// One-line status summary used by the rule path
fn status_summary(state: MentalState, request: &CoachingRequest) -> String {
    let affect = &request.combined.affect;
    let cues = request.cues();
    format!(
        "상태: {} · 스트레스 {} · 에너지 {} · 각성 {} / 긴장 {} / 안정 {}",
        state.label(),
        affect.stress,
        affect.energy,
        cues.arousal as i32,
        cues.tension as i32,
        cues.stability as i32
    )
}

// ============================================================================
// Language model strategy
// ============================================================================

#[derive(Debug, Deserialize)]
struct CoachingReply {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    positives: Option<Vec<String>>,
    #[serde(default)]
    recommendations: Option<Vec<String>>,
    #[serde(default)]
    motivation: Option<String>,
    #[serde(default)]
    citations: Option<Vec<String>>,
}

/// User turn: entry, scores, cues, state, history and labelled chunks
pub fn build_user_payload(request: &CoachingRequest) -> String {
    let affect = &request.combined.affect;
    let cues = request.cues();
    let history_start = request.history.len().saturating_sub(HISTORY_WINDOW);

    let knowledge = request
        .retrieved
        .iter()
        .enumerate()
        .map(|(i, chunk)| format!("[S{}] ({} p.{}) {}", i + 1, chunk.source, chunk.page, chunk.text))
        .collect::<Vec<_>>()
        .join("\n\n");

    json!({
        "text": request.text,
        "text_analysis": {
            "emotions": affect.emotions.iter().map(|e| e.label()).collect::<Vec<_>>(),
            "stress": affect.stress,
            "energy": affect.energy,
            "mood": affect.mood,
            "tone": affect.tone.label(),
        },
        "voice_cues": {
            "arousal": cues.arousal as i32,
            "tension": cues.tension as i32,
            "stability": cues.stability as i32,
            "quality": cues.quality,
        },
        "state": request.state().label(),
        "recent_summary": &request.history[history_start..],
        "kb_context": knowledge,
    })
    .to_string()
}

/// Language model strategy
pub struct LlmCoaching {
    client: Arc<dyn LanguageModelClient>,
}

impl LlmCoaching {
    pub fn new(client: Arc<dyn LanguageModelClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Strategy for LlmCoaching {
    type Input = CoachingRequest;
    type Output = CoachingRecord;

    fn name(&self) -> &'static str {
        "llm-coaching"
    }

    async fn attempt(&self, input: &CoachingRequest) -> Result<CoachingRecord, AnalysisFailure> {
        let request = ChatRequest::new(SYSTEM_PROMPT, build_user_payload(input))
            .with_temperature(0.4)
            .with_max_tokens(700);
        let reply = self.client.complete(&request).await?;
        let parsed: CoachingReply = parse_typed(&reply)?;

        let mut positives: Vec<String> = parsed
            .positives
            .unwrap_or_default()
            .into_iter()
            .filter(|p| !p.trim().is_empty())
            .collect();
        positives.truncate(MAX_POSITIVES);

        let mut recommendations: Vec<String> = parsed
            .recommendations
            .unwrap_or_default()
            .into_iter()
            .filter(|r| !r.trim().is_empty())
            .collect();
        recommendations.truncate(MAX_RECOMMENDATIONS);

        // Declared labels first, then labels cited inline
        let inline = recommendations
            .iter()
            .flat_map(|r| INLINE_LABEL_RE.captures_iter(r))
            .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()));
        let mut citations: Vec<Citation> = Vec::new();
        for label in parsed.citations.unwrap_or_default().into_iter().chain(inline) {
            let label = label.trim().trim_start_matches('[').trim_end_matches(']').to_string();
            if citations.iter().any(|c| c.label == label) {
                continue;
            }
            match input.citation(&label) {
                Some(citation) => citations.push(citation),
                None => debug!(label = %label, "Dropping citation of unknown chunk"),
            }
        }
        citations.truncate(MAX_CITATIONS);

        Ok(CoachingRecord {
            state: input.state(),
            summary: parsed
                .summary
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SUMMARY.to_string()),
            positives,
            recommendations,
            motivation: parsed
                .motivation
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_MOTIVATION.to_string()),
            citations,
            voice_cues: input.combined.cues().copied(),
        })
    }
}

// ============================================================================
// Rule fallback
// ============================================================================

/// Rule-table coaching
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleCoaching;

impl RuleCoaching {
    fn base_recommendations(request: &CoachingRequest, positives: &[String]) -> Vec<String> {
        let affect = &request.combined.affect;
        let cues = request.cues();
        let mut recs = Vec::new();

        if affect.tone == Tone::Positive || !positives.is_empty() {
            if !positives.is_empty() {
                recs.push("오늘 좋았던 포인트를 3줄로 기록해 보세요 (감사/성취/즐거움).".to_string());
            }
            recs.push("좋았던 활동을 내일 10분만 더 해보기.".to_string());
        }
        if cues.tension > 60.0 {
            recs.push("4-7-8 호흡 3회: 4초 들이마시고, 7초 멈추고, 8초 내쉬기.".to_string());
        }
        if cues.stability < 50.0 {
            recs.push("목/어깨 이완 스트레칭 2분 (상체 회전, 목 옆선 늘리기).".to_string());
        }
        if cues.arousal < 45.0 || affect.energy < 45 {
            recs.push("햇빛 10분 산책 + 가벼운 워킹 (Step 800~1000).".to_string());
        }
        if cues.arousal > 65.0 && affect.stress > 50 {
            recs.push("알림/자극 줄이기: 25분 집중 + 5분 휴식(포모도로 2회).".to_string());
        }
        recs
    }

    fn motivation(state: MentalState) -> &'static str {
        match state {
            MentalState::HighStress | MentalState::OverTension => {
                "호흡을 고르고, 천천히. 당신의 속도로 충분합니다."
            }
            MentalState::LowVitality | MentalState::LowArousal => {
                "작은 한 걸음이 에너지를 깨웁니다. 10분만 움직여볼까요?"
            }
            MentalState::PossibleOverload => "잠시 멈추는 것도 전진입니다. 자극을 줄이고 쉬어가요.",
            MentalState::StableRecovering | MentalState::Neutral => {
                "작은 습관이 오늘의 좋은 흐름을 내일로 이어줍니다."
            }
        }
    }

    /// Opening line of a chunk, bounded
    fn tip(chunk: &ChunkMatch) -> Option<String> {
        let line = chunk.text.lines().map(str::trim).find(|l| !l.is_empty())?;
        Some(line.chars().take(TIP_MAX_CHARS).collect())
    }
}

impl Fallback for RuleCoaching {
    type Input = CoachingRequest;
    type Output = CoachingRecord;

    fn name(&self) -> &'static str {
        "rule-coaching"
    }

    fn produce(&self, input: &CoachingRequest) -> CoachingRecord {
        let state = input.state();
        let positives = positive_events(&input.text);

        let tips: Vec<(String, Citation)> = input
            .retrieved
            .iter()
            .enumerate()
            .filter_map(|(i, chunk)| {
                let tip = Self::tip(chunk)?;
                let citation = input.citation(&format!("S{}", i + 1))?;
                Some((tip, citation))
            })
            .take(MAX_GROUNDED_TIPS)
            .collect();

        let mut recommendations = Self::base_recommendations(input, &positives);
        recommendations.truncate(MAX_RECOMMENDATIONS - tips.len());

        let mut citations = Vec::with_capacity(tips.len());
        for (tip, citation) in tips {
            recommendations.push(format!("{} [{}]", tip, citation.label));
            citations.push(citation);
        }

        CoachingRecord {
            state,
            summary: status_summary(state, input),
            positives,
            recommendations,
            motivation: Self::motivation(state).to_string(),
            citations,
            voice_cues: input.combined.cues().copied(),
        }
    }
}

// ============================================================================
// Composer
// ============================================================================

/// Coaching with rule fallback; never fails
pub struct CoachingComposer {
    step: OrElse<LlmCoaching, RuleCoaching>,
}

impl CoachingComposer {
    pub fn new(client: Arc<dyn LanguageModelClient>) -> Self {
        Self {
            step: LlmCoaching::new(client).or_else(RuleCoaching),
        }
    }

    pub async fn compose(
        &self,
        text: &str,
        combined: &CombinedAffect,
        retrieved: &[ChunkMatch],
        history: &[HistoryPoint],
    ) -> CoachingRecord {
        let request = CoachingRequest {
            text: text.to_string(),
            combined: combined.clone(),
            retrieved: retrieved.to_vec(),
            history: history.to_vec(),
        };
        let record = self.step.run(&request).await;
        debug!(
            state = record.state.label(),
            recommendations = record.recommendations.len(),
            citations = record.citations.len(),
            "Coaching composed"
        );
        record
    }
}
