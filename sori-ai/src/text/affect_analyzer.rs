//! Text Affect Analyzer
//!
//! Estimates emotions, stress, energy and mood from the journal text. The
//! language model is the primary strategy; the keyword counter answers any
//! failure. Voice cues may be shown to the model as advisory numbers, but the
//! emotion labels must come from the text alone.

use crate::services::{ChatRequest, LanguageModelClient};
use crate::text::keywords::KeywordTextAffect;
use crate::text::TextAffectRequest;
use crate::types::{
    clamp_mood, clamp_score, AnalysisFailure, Emotion, OrElse, Strategy, StrategyExt, TextAffect,
    Tone,
};
use crate::utils::parse_typed;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

const SYSTEM_PROMPT: &str = concat!(
    "감정 라벨(기쁨/슬픔/분노/불안/평온/피로/중립)은 텍스트로만 판단하세요. ",
    "음성 지표는 수치 보조로만 참고하고 라벨을 바꾸지 마세요. ",
    "다음 JSON 형식으로만 응답하세요: ",
    r#"{"emotions": ["감정1", "감정2"], "stress_level": 0-100, "energy_level": 0-100, "#,
    r#""mood_score": -70~70, "summary": "요약", "keywords": ["키워드"], "#,
    r#""tone": "긍정적|중립적|부정적", "confidence": 0-1}"#
);

const DEFAULT_SUMMARY: &str = "일반적인 상태입니다.";

/// Reply schema; every field optional with documented defaults
#[derive(Debug, Deserialize)]
struct TextAffectReply {
    #[serde(default)]
    emotions: Option<Vec<String>>,
    #[serde(default)]
    stress_level: Option<f64>,
    #[serde(default)]
    energy_level: Option<f64>,
    #[serde(default)]
    mood_score: Option<f64>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    keywords: Option<Vec<String>>,
    #[serde(default)]
    tone: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
}

impl TextAffectReply {
    fn into_affect(self) -> TextAffect {
        let emotions = self
            .emotions
            .unwrap_or_default()
            .iter()
            .filter_map(|label| Emotion::from_label(label))
            .collect();

        TextAffect {
            emotions,
            stress: clamp_score(self.stress_level.unwrap_or(30.0)),
            energy: clamp_score(self.energy_level.unwrap_or(50.0)),
            mood: clamp_mood(self.mood_score.unwrap_or(0.0)),
            tone: self
                .tone
                .as_deref()
                .and_then(Tone::from_label)
                .unwrap_or_default(),
            confidence: self.confidence.unwrap_or(0.7),
            summary: self
                .summary
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SUMMARY.to_string()),
            keywords: self.keywords.unwrap_or_default(),
        }
        .normalized()
    }
}

/// User turn: the entry text plus the optional advisory cue line
pub fn build_user_prompt(request: &TextAffectRequest) -> String {
    let mut prompt = format!("오늘의 이야기: {}", request.text);
    if let Some(cues) = &request.cues {
        prompt.push_str(&format!(
            "\n(보조지표) 각성:{}, 긴장:{}, 안정:{}, 품질:{:.2}",
            cues.arousal as i32, cues.tension as i32, cues.stability as i32, cues.quality
        ));
    }
    prompt
}

/// Language model strategy
pub struct LlmTextAffect {
    client: Arc<dyn LanguageModelClient>,
}

impl LlmTextAffect {
    pub fn new(client: Arc<dyn LanguageModelClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Strategy for LlmTextAffect {
    type Input = TextAffectRequest;
    type Output = TextAffect;

    fn name(&self) -> &'static str {
        "llm-text-affect"
    }

    async fn attempt(&self, input: &TextAffectRequest) -> Result<TextAffect, AnalysisFailure> {
        let request = ChatRequest::new(SYSTEM_PROMPT, build_user_prompt(input))
            .with_temperature(0.3)
            .with_max_tokens(500);
        let reply = self.client.complete(&request).await?;
        let parsed: TextAffectReply = parse_typed(&reply)?;
        Ok(parsed.into_affect())
    }
}

/// Text affect analysis with keyword fallback; never fails
pub struct TextAffectAnalyzer {
    step: OrElse<LlmTextAffect, KeywordTextAffect>,
}

impl TextAffectAnalyzer {
    pub fn new(client: Arc<dyn LanguageModelClient>) -> Self {
        Self {
            step: LlmTextAffect::new(client).or_else(KeywordTextAffect),
        }
    }

    pub async fn analyze(&self, request: &TextAffectRequest) -> TextAffect {
        let affect = self.step.run(request).await;
        debug!(
            stress = affect.stress,
            energy = affect.energy,
            mood = affect.mood,
            tone = ?affect.tone,
            "Text affect analyzed"
        );
        affect
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::NullLanguageModel;
    use crate::types::VoiceCues;
    use std::sync::Mutex;

    /// Returns a canned reply and records the last request
    struct ScriptedModel {
        reply: Result<String, AnalysisFailure>,
        last_request: Mutex<Option<ChatRequest>>,
    }

    impl ScriptedModel {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                last_request: Mutex::new(None),
            })
        }

        fn failing(failure: AnalysisFailure) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(failure),
                last_request: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl LanguageModelClient for ScriptedModel {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn complete(&self, request: &ChatRequest) -> Result<String, AnalysisFailure> {
            *self.last_request.lock().unwrap() = Some(request.clone());
            self.reply.clone()
        }
    }

    fn request(text: &str) -> TextAffectRequest {
        TextAffectRequest {
            text: text.to_string(),
            cues: None,
        }
    }

    #[tokio::test]
    async fn test_model_reply_is_used() {
        let model = ScriptedModel::replying(
            r#"```json
            {"emotions": ["행복", "평온", "기쁨"], "stress_level": 22.4, "energy_level": 71,
             "mood_score": 35, "summary": "즐거운 하루", "keywords": ["산책"],
             "tone": "긍정적", "confidence": 0.9}
            ```"#,
        );
        let analyzer = TextAffectAnalyzer::new(model);
        let affect = analyzer.analyze(&request("산책이 즐거웠다")).await;

        assert_eq!(affect.emotions, vec![Emotion::Joy, Emotion::Calm]);
        assert_eq!(affect.stress, 22);
        assert_eq!(affect.energy, 71);
        assert_eq!(affect.mood, 35);
        assert_eq!(affect.tone, Tone::Positive);
        assert_eq!(affect.summary, "즐거운 하루");
        assert_eq!(affect.keywords, vec!["산책".to_string()]);
        assert_eq!(affect.confidence, 0.9);
    }

    #[tokio::test]
    async fn test_missing_fields_take_defaults() {
        let model = ScriptedModel::replying(r#"{"stress_level": 180}"#);
        let affect = TextAffectAnalyzer::new(model).analyze(&request("...")).await;

        assert_eq!(affect.emotions, vec![Emotion::Neutral]);
        assert_eq!(affect.stress, 100);
        assert_eq!(affect.energy, 50);
        assert_eq!(affect.mood, 0);
        assert_eq!(affect.tone, Tone::Neutral);
        assert_eq!(affect.confidence, 0.7);
        assert_eq!(affect.summary, DEFAULT_SUMMARY);
    }

    #[tokio::test]
    async fn test_empty_object_uses_keywords() {
        let model = ScriptedModel::replying("{}");
        let affect = TextAffectAnalyzer::new(model)
            .analyze(&request("오늘 정말 행복하고 행복했어요"))
            .await;
        assert_eq!(affect.confidence, 0.55);
        assert_eq!(affect.tone, Tone::Positive);
    }

    #[tokio::test]
    async fn test_schema_mismatch_uses_keywords() {
        let model = ScriptedModel::replying(r#"{"stress_level": "매우 높음"}"#);
        let affect = TextAffectAnalyzer::new(model).analyze(&request("걱정이 많다")).await;
        assert_eq!(affect.tone, Tone::Negative);
        assert_eq!(affect.confidence, 0.55);
    }

    #[tokio::test]
    async fn test_service_failure_uses_keywords() {
        let model = ScriptedModel::failing(AnalysisFailure::Timeout);
        let affect = TextAffectAnalyzer::new(model).analyze(&request("평범한 하루")).await;
        assert_eq!(affect.emotions, vec![Emotion::Neutral]);
    }

    #[tokio::test]
    async fn test_null_model_uses_keywords() {
        let affect = TextAffectAnalyzer::new(Arc::new(NullLanguageModel))
            .analyze(&request("오늘 정말 행복하고 행복했어요"))
            .await;
        assert_eq!(affect.emotions, vec![Emotion::Joy]);
        assert!(affect.stress < 40);
        assert!(affect.energy > 50);
        assert!(affect.mood > 0);
    }

    #[tokio::test]
    async fn test_cue_line_is_sent() {
        let model = ScriptedModel::replying(r#"{"tone": "중립적"}"#);
        let analyzer = TextAffectAnalyzer::new(model.clone());
        let req = TextAffectRequest {
            text: "회의가 길었다".to_string(),
            cues: Some(VoiceCues {
                arousal: 61.7,
                tension: 40.2,
                stability: 55.0,
                quality: 0.456,
            }),
        };
        analyzer.analyze(&req).await;

        let sent = model.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(
            sent.user,
            "오늘의 이야기: 회의가 길었다\n(보조지표) 각성:61, 긴장:40, 안정:55, 품질:0.46"
        );
        assert_eq!(sent.temperature, 0.3);
        assert_eq!(sent.max_tokens, 500);
    }
}
