//! Text affect analysis: language model with keyword fallback

pub mod affect_analyzer;
pub mod keywords;

pub use affect_analyzer::{LlmTextAffect, TextAffectAnalyzer};
pub use keywords::KeywordTextAffect;

use crate::types::VoiceCues;

/// Input to text affect analysis
#[derive(Debug, Clone, PartialEq)]
pub struct TextAffectRequest {
    pub text: String,
    /// Advisory voice cues shown to the language model
    pub cues: Option<VoiceCues>,
}
