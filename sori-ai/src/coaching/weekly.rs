//! Weekly report
//!
//! Summarises the last seven entries. The language model writes the report
//! when at least seven entries exist and a client is configured; otherwise,
//! or on any failure, the rule-based report is used.

use crate::models::EntryRecord;
use crate::services::{ChatRequest, LanguageModelClient};
use crate::types::{AnalysisFailure, Fallback, OrElse, Strategy, StrategyExt};
use crate::utils::parse_typed;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

/// Entries covered by one report
pub const WEEK_WINDOW: usize = 7;

/// Fewer entries than this yields the fixed starter report
pub const MIN_ENTRIES: usize = 3;

const TEXT_EXCERPT_CHARS: usize = 100;

const SYSTEM_PROMPT: &str = concat!(
    "당신은 전문적인 웰빙 코치입니다. 지난 7일간의 감정 기록을 분석하여 개인화된 주간 리포트를 작성해주세요. ",
    "다음 JSON 형식으로만 답하세요: ",
    r#"{"overall_trend": "추세", "key_insights": ["인사이트"], "#,
    r#""patterns": {"best_days": ["날짜"], "challenging_days": ["날짜"], "emotional_patterns": "패턴설명"}, "#,
    r#""recommendations": {"priority_actions": ["행동"], "wellness_tips": ["팁"], "goals_for_next_week": ["목표"]}, "#,
    r#""encouragement": "격려메시지"}"#
);

/// Rule-based trend classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeeklyTrend {
    Improved,
    NeedsAttention,
    Stable,
}

impl WeeklyTrend {
    pub fn label(&self) -> &'static str {
        match self {
            WeeklyTrend::Improved => "개선됨",
            WeeklyTrend::NeedsAttention => "주의필요",
            WeeklyTrend::Stable => "안정적",
        }
    }

    pub fn classify(avg_stress: f64, avg_energy: f64) -> Self {
        if avg_stress < 40.0 && avg_energy > 60.0 {
            WeeklyTrend::Improved
        } else if avg_stress > 70.0 || avg_energy < 30.0 {
            WeeklyTrend::NeedsAttention
        } else {
            WeeklyTrend::Stable
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeeklyPatterns {
    pub best_days: Vec<String>,
    pub challenging_days: Vec<String>,
    pub emotional_patterns: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeeklyRecommendations {
    pub priority_actions: Vec<String>,
    pub wellness_tips: Vec<String>,
    pub goals_for_next_week: Vec<String>,
}

/// Seven-day summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeeklyReport {
    pub overall_trend: String,
    pub key_insights: Vec<String>,
    pub patterns: WeeklyPatterns,
    pub recommendations: WeeklyRecommendations,
    pub encouragement: String,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Rule-based report
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleWeekly;

impl RuleWeekly {
    fn starter_report() -> WeeklyReport {
        WeeklyReport {
            overall_trend: WeeklyTrend::Stable.label().to_string(),
            key_insights: strings(&["아직 분석하기에 충분한 데이터가 없습니다."]),
            patterns: WeeklyPatterns {
                best_days: Vec::new(),
                challenging_days: Vec::new(),
                emotional_patterns: "더 많은 기록이 필요합니다.".to_string(),
            },
            recommendations: WeeklyRecommendations {
                priority_actions: strings(&["꾸준한 기록 유지하기"]),
                wellness_tips: strings(&["하루 10분 자기 성찰 시간 갖기"]),
                goals_for_next_week: strings(&["매일 감정 기록하기"]),
            },
            encouragement: "좋은 시작입니다! 꾸준히 기록해보세요.".to_string(),
        }
    }
}

impl Fallback for RuleWeekly {
    type Input = [EntryRecord];
    type Output = WeeklyReport;

    fn name(&self) -> &'static str {
        "rule-weekly"
    }

    fn produce(&self, entries: &[EntryRecord]) -> WeeklyReport {
        if entries.len() < MIN_ENTRIES {
            return Self::starter_report();
        }

        let recent = &entries[entries.len().saturating_sub(WEEK_WINDOW)..];
        let n = recent.len() as f64;
        let average = |score: fn(&EntryRecord) -> i32| {
            recent.iter().map(|e| score(e) as f64).sum::<f64>() / n
        };
        let avg_stress = average(|e| e.analysis.affect.stress);
        let avg_energy = average(|e| e.analysis.affect.energy);
        let avg_mood = average(|e| e.analysis.affect.mood);
        let trend = WeeklyTrend::classify(avg_stress, avg_energy);

        // First entry wins ties on both ends
        let mut best = &recent[0];
        let mut worst = &recent[0];
        for entry in recent {
            if entry.analysis.affect.mood > best.analysis.affect.mood {
                best = entry;
            }
            if entry.analysis.affect.mood < worst.analysis.affect.mood {
                worst = entry;
            }
        }

        WeeklyReport {
            overall_trend: trend.label().to_string(),
            key_insights: vec![
                format!("평균 스트레스: {:.0}점", avg_stress),
                format!("평균 에너지: {:.0}점", avg_energy),
                format!("평균 기분: {:.0}점", avg_mood),
            ],
            patterns: WeeklyPatterns {
                best_days: vec![best.date.clone()],
                challenging_days: vec![worst.date.clone()],
                emotional_patterns: format!(
                    "이번 주는 전반적으로 {} 상태를 보였습니다.",
                    trend.label()
                ),
            },
            recommendations: WeeklyRecommendations {
                priority_actions: if avg_stress > 50.0 {
                    strings(&["스트레스 관리에 집중", "규칙적인 운동"])
                } else {
                    strings(&["현재 상태 유지"])
                },
                wellness_tips: strings(&["명상 5분", "자연 산책", "충분한 수면"]),
                goals_for_next_week: strings(&["스트레스 지수 40 이하 유지", "매일 감정 기록"]),
            },
            encouragement: "매일 기록하고 계시는 노력이 대단합니다!".to_string(),
        }
    }
}

/// Language model report over the last seven entries
pub struct LlmWeekly {
    client: Arc<dyn LanguageModelClient>,
}

impl LlmWeekly {
    pub fn new(client: Arc<dyn LanguageModelClient>) -> Self {
        Self { client }
    }
}

fn week_payload(entries: &[EntryRecord]) -> String {
    let recent = &entries[entries.len().saturating_sub(WEEK_WINDOW)..];
    let days: Vec<_> = recent
        .iter()
        .map(|entry| {
            let affect = &entry.analysis.affect;
            let excerpt = if entry.text.chars().count() > TEXT_EXCERPT_CHARS {
                format!(
                    "{}...",
                    entry.text.chars().take(TEXT_EXCERPT_CHARS).collect::<String>()
                )
            } else {
                entry.text.clone()
            };
            json!({
                "date": entry.date,
                "emotions": affect.emotions.iter().map(|e| e.label()).collect::<Vec<_>>(),
                "stress": affect.stress,
                "energy": affect.energy,
                "mood": affect.mood,
                "tone": affect.tone.label(),
                "text_summary": excerpt,
            })
        })
        .collect();
    format!("지난 7일간의 데이터: {}", serde_json::Value::from(days))
}

#[async_trait]
impl Strategy for LlmWeekly {
    type Input = [EntryRecord];
    type Output = WeeklyReport;

    fn name(&self) -> &'static str {
        "llm-weekly"
    }

    async fn attempt(&self, entries: &[EntryRecord]) -> Result<WeeklyReport, AnalysisFailure> {
        if entries.len() < WEEK_WINDOW {
            return Err(AnalysisFailure::Unavailable(format!(
                "{} entries, {} needed",
                entries.len(),
                WEEK_WINDOW
            )));
        }
        if !self.client.is_available() {
            return Err(AnalysisFailure::Unavailable(format!(
                "{} client not configured",
                self.client.name()
            )));
        }

        let request = ChatRequest::new(SYSTEM_PROMPT, week_payload(entries))
            .with_temperature(0.4)
            .with_max_tokens(800);
        let reply = self.client.complete(&request).await?;
        let report: WeeklyReport = parse_typed(&reply)?;
        if report.overall_trend.trim().is_empty() && report.key_insights.is_empty() {
            return Err(AnalysisFailure::Schema("Report has no trend or insights".to_string()));
        }
        Ok(report)
    }
}

/// Weekly report with rule fallback; never fails
pub struct WeeklyReporter {
    step: OrElse<LlmWeekly, RuleWeekly>,
}

impl WeeklyReporter {
    pub fn new(client: Arc<dyn LanguageModelClient>) -> Self {
        Self {
            step: LlmWeekly::new(client).or_else(RuleWeekly),
        }
    }

    pub async fn report(&self, entries: &[EntryRecord]) -> WeeklyReport {
        let report = self.step.run(entries).await;
        debug!(entries = entries.len(), trend = %report.overall_trend, "Weekly report ready");
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coaching::{CoachingRecord, MentalState};
    use crate::services::NullLanguageModel;
    use crate::types::{CombinedAffect, Emotion, TextAffect, Tone};

    struct CannedModel(String);

    #[async_trait]
    impl LanguageModelClient for CannedModel {
        fn name(&self) -> &'static str {
            "canned"
        }

        async fn complete(&self, _: &ChatRequest) -> Result<String, AnalysisFailure> {
            Ok(self.0.clone())
        }
    }

    fn entry(day: u32, stress: i32, energy: i32, mood: i32) -> EntryRecord {
        EntryRecord {
            id: day as u64,
            date: format!("2026-10-{:02}", day),
            time: "21:00".to_string(),
            text: "기록".to_string(),
            analysis: CombinedAffect {
                affect: TextAffect {
                    emotions: vec![Emotion::Neutral],
                    stress,
                    energy,
                    mood,
                    tone: Tone::Neutral,
                    confidence: 0.7,
                    summary: String::new(),
                    keywords: Vec::new(),
                },
                voice: None,
            },
            audio_data: None,
            mental_state: CoachingRecord {
                state: MentalState::Neutral,
                summary: String::new(),
                positives: Vec::new(),
                recommendations: Vec::new(),
                motivation: String::new(),
                citations: Vec::new(),
                voice_cues: None,
            },
        }
    }

    #[tokio::test]
    async fn test_too_few_entries_gives_starter_report() {
        let reporter = WeeklyReporter::new(Arc::new(NullLanguageModel));
        let report = reporter.report(&[entry(1, 50, 50, 0), entry(2, 50, 50, 0)]).await;
        assert_eq!(report.overall_trend, "안정적");
        assert_eq!(report.key_insights, vec!["아직 분석하기에 충분한 데이터가 없습니다."]);
    }

    #[tokio::test]
    async fn test_rule_report_uses_last_seven() {
        let mut entries = vec![entry(1, 100, 0, -70)];
        for day in 2..=8 {
            entries.push(entry(day, 30, 70, (day as i32) * 5));
        }
        entries[4].analysis.affect.mood = 40;

        let report = WeeklyReporter::new(Arc::new(NullLanguageModel)).report(&entries).await;
        assert_eq!(report.overall_trend, "개선됨");
        assert_eq!(report.key_insights[0], "평균 스트레스: 30점");
        assert_eq!(report.patterns.best_days, vec!["2026-10-05"]);
        assert_eq!(report.patterns.challenging_days, vec!["2026-10-02"]);
        assert_eq!(report.recommendations.priority_actions, vec!["현재 상태 유지"]);
    }

    #[test]
    fn test_rule_report_over_borrowed_window() {
        let entries: Vec<EntryRecord> = (1..=5).map(|day| entry(day, 80, 20, -(day as i32))).collect();

        // Only the last three entries are reported on
        let report = RuleWeekly.produce(&entries[2..]);
        assert_eq!(report.overall_trend, "주의필요");
        assert_eq!(report.patterns.best_days, vec!["2026-10-03"]);
        assert_eq!(report.patterns.challenging_days, vec!["2026-10-05"]);
        assert_eq!(RuleWeekly.produce(&entries[..2]).key_insights.len(), 1);
    }

    #[test]
    fn test_trend_classification() {
        assert_eq!(WeeklyTrend::classify(39.0, 61.0), WeeklyTrend::Improved);
        assert_eq!(WeeklyTrend::classify(71.0, 61.0), WeeklyTrend::NeedsAttention);
        assert_eq!(WeeklyTrend::classify(50.0, 29.0), WeeklyTrend::NeedsAttention);
        assert_eq!(WeeklyTrend::classify(40.0, 60.0), WeeklyTrend::Stable);
    }

    #[tokio::test]
    async fn test_model_report_needs_seven_entries() {
        let reply = r#"{"overall_trend": "회복 중", "key_insights": ["수면이 개선됨"]}"#;
        let reporter = WeeklyReporter::new(Arc::new(CannedModel(reply.to_string())));

        let six: Vec<_> = (1..=6).map(|d| entry(d, 80, 20, -30)).collect();
        assert_eq!(reporter.report(&six).await.overall_trend, "주의필요");

        let seven: Vec<_> = (1..=7).map(|d| entry(d, 80, 20, -30)).collect();
        let report = reporter.report(&seven).await;
        assert_eq!(report.overall_trend, "회복 중");
        assert_eq!(report.key_insights, vec!["수면이 개선됨"]);
        assert!(report.patterns.best_days.is_empty());
    }

    #[tokio::test]
    async fn test_unusable_model_reply_falls_back() {
        let reporter = WeeklyReporter::new(Arc::new(CannedModel("[1, 2, 3]".to_string())));
        let seven: Vec<_> = (1..=7).map(|d| entry(d, 50, 50, 0)).collect();
        assert_eq!(reporter.report(&seven).await.overall_trend, "안정적");
    }
}
