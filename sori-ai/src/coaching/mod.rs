//! Coaching: mental state, retrieval query, coaching record, weekly report

pub mod composer;
pub mod query;
pub mod state;
pub mod weekly;

pub use composer::{CoachingComposer, CoachingRequest, LlmCoaching, RuleCoaching};
pub use query::derive_action_query;
pub use state::{positive_events, MentalState};
pub use weekly::{WeeklyReport, WeeklyReporter, WeeklyTrend};

use crate::types::{Tone, VoiceCues};
use serde::{Deserialize, Serialize};

/// Maximum recommendations per record
pub const MAX_RECOMMENDATIONS: usize = 4;

/// Maximum citations per record
pub const MAX_CITATIONS: usize = 5;

/// Knowledge chunk a recommendation is grounded in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Label shown to the model (`S1` is the first retrieved chunk)
    pub label: String,
    pub source: String,
    pub page: usize,
}

/// Final coaching output for one entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachingRecord {
    pub state: MentalState,
    pub summary: String,
    /// At most four
    pub positives: Vec<String>,
    /// At most four
    pub recommendations: Vec<String>,
    pub motivation: String,
    /// At most five
    #[serde(default)]
    pub citations: Vec<Citation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_cues: Option<VoiceCues>,
}

/// Compact view of a past entry shown to the coaching model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPoint {
    pub date: String,
    pub tone: Tone,
    pub stress: i32,
    pub energy: i32,
    pub mood: i32,
}
