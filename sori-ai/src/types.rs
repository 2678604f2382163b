//! Core Types and Trait Definitions for sori-ai
//!
//! Defines the records that flow through the journal analysis pipeline and
//! the strategy traits used to pair a fallible primary analysis with an
//! infallible fallback:
//! - **Voice:** RawAudioFeatures → VoiceCues
//! - **Text:** TextAffect
//! - **Fusion:** CombinedAffect
//!
//! # Architecture
//! Every analysis step that depends on an external service is a [`Strategy`]
//! composed with a [`Fallback`] through [`OrElse`]. The composed step never
//! fails; failures of the primary are logged and replaced by the fallback
//! output.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

// ============================================================================
// Score Ranges
// ============================================================================

/// Stress and energy scores are clamped into `[0, SCORE_MAX]`
pub const SCORE_MAX: i32 = 100;

/// Mood scores are clamped into `[-MOOD_LIMIT, MOOD_LIMIT]`
pub const MOOD_LIMIT: i32 = 70;

/// Maximum number of emotion labels kept per entry
pub const MAX_EMOTIONS: usize = 2;

/// Clamp a stress or energy score into range
pub fn clamp_score(value: f64) -> i32 {
    if !value.is_finite() {
        return 0;
    }
    (value.round() as i32).clamp(0, SCORE_MAX)
}

/// Clamp a mood score into range
pub fn clamp_mood(value: f64) -> i32 {
    if !value.is_finite() {
        return 0;
    }
    (value.round() as i32).clamp(-MOOD_LIMIT, MOOD_LIMIT)
}

// ============================================================================
// Voice Types
// ============================================================================

/// Raw acoustic measurements from one pass over one clip
///
/// `Default` is the fixed fallback record used whenever decoding or a
/// mandatory measurement fails.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawAudioFeatures {
    /// Clip length in seconds
    pub duration_sec: f64,
    /// Mean fundamental frequency (Hz)
    pub pitch_mean: f64,
    /// Coefficient of variation of the fundamental frequency
    pub pitch_variation: f64,
    /// Mean frame RMS
    pub energy_mean: f64,
    /// Peak frame RMS
    pub energy_max: f64,
    /// Estimated tempo (BPM)
    pub tempo: f64,
    /// Mean zero-crossing rate (0-1)
    pub zcr_mean: f64,
    /// Mean spectral centroid (Hz)
    pub spectral_centroid_mean: f64,
    /// Harmonics-to-noise ratio (dB)
    pub hnr: f64,
    /// Local jitter (fraction)
    pub jitter: f64,
}

impl Default for RawAudioFeatures {
    fn default() -> Self {
        Self {
            duration_sec: 0.0,
            pitch_mean: 150.0,
            pitch_variation: 0.13,
            energy_mean: 0.08,
            energy_max: 0.12,
            tempo: 110.0,
            zcr_mean: 0.10,
            spectral_centroid_mean: 2000.0,
            hnr: 15.0,
            jitter: 0.012,
        }
    }
}

impl RawAudioFeatures {
    /// True when every field is a finite number
    pub fn is_finite(&self) -> bool {
        [
            self.duration_sec,
            self.pitch_mean,
            self.pitch_variation,
            self.energy_mean,
            self.energy_max,
            self.tempo,
            self.zcr_mean,
            self.spectral_centroid_mean,
            self.hnr,
            self.jitter,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// Normalized prosodic dimensions
///
/// arousal, tension and stability are in `[0, 100]`; quality is in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceCues {
    pub arousal: f64,
    pub tension: f64,
    pub stability: f64,
    pub quality: f64,
}

impl Default for VoiceCues {
    /// Neutral midpoint cues used when no voice was recorded
    fn default() -> Self {
        Self {
            arousal: 50.0,
            tension: 50.0,
            stability: 50.0,
            quality: 0.0,
        }
    }
}

/// Voice analysis embedded in a combined record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceAnalysis {
    pub features: RawAudioFeatures,
    pub cues: VoiceCues,
}

// ============================================================================
// Text Types
// ============================================================================

/// Fixed emotion vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Emotion {
    #[serde(rename = "기쁨")]
    Joy,
    #[serde(rename = "슬픔")]
    Sadness,
    #[serde(rename = "분노")]
    Anger,
    #[serde(rename = "불안")]
    Anxiety,
    #[serde(rename = "평온")]
    Calm,
    #[serde(rename = "피로")]
    Fatigue,
    #[serde(rename = "중립")]
    Neutral,
}

impl Emotion {
    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            Emotion::Joy => "기쁨",
            Emotion::Sadness => "슬픔",
            Emotion::Anger => "분노",
            Emotion::Anxiety => "불안",
            Emotion::Calm => "평온",
            Emotion::Fatigue => "피로",
            Emotion::Neutral => "중립",
        }
    }

    /// Map a free-form label onto the vocabulary
    ///
    /// Accepts the vocabulary labels, their English names, and common
    /// synonyms language models produce. Unknown labels return `None`.
    pub fn from_label(label: &str) -> Option<Emotion> {
        let label = label.trim().to_lowercase();
        let emotion = match label.as_str() {
            "기쁨" | "행복" | "즐거움" | "설렘" | "만족" | "뿌듯함" | "joy" | "happy" | "happiness" => {
                Emotion::Joy
            }
            "슬픔" | "우울" | "외로움" | "sadness" | "sad" => Emotion::Sadness,
            "분노" | "화" | "짜증" | "anger" | "angry" => Emotion::Anger,
            "불안" | "걱정" | "긴장" | "스트레스" | "anxiety" | "anxious" | "stress" => {
                Emotion::Anxiety
            }
            "평온" | "안정" | "편안" | "감사" | "calm" | "relaxed" => Emotion::Calm,
            "피로" | "피곤" | "지침" | "fatigue" | "tired" => Emotion::Fatigue,
            "중립" | "neutral" => Emotion::Neutral,
            _ => return None,
        };
        Some(emotion)
    }
}

/// Overall tone of a journal entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl Tone {
    /// Korean display label
    pub fn label(&self) -> &'static str {
        match self {
            Tone::Positive => "긍정적",
            Tone::Neutral => "중립적",
            Tone::Negative => "부정적",
        }
    }

    /// Parse a tone from English or Korean wording
    pub fn from_label(label: &str) -> Option<Tone> {
        let label = label.trim().to_lowercase();
        if label.starts_with("positive") || label.starts_with("긍정") {
            Some(Tone::Positive)
        } else if label.starts_with("negative") || label.starts_with("부정") {
            Some(Tone::Negative)
        } else if label.starts_with("neutral") || label.starts_with("중립") {
            Some(Tone::Neutral)
        } else {
            None
        }
    }
}

/// Text-only affect estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextAffect {
    /// At most [`MAX_EMOTIONS`] labels, never empty
    pub emotions: Vec<Emotion>,
    /// 0-100
    pub stress: i32,
    /// 0-100
    pub energy: i32,
    /// -70..=70
    pub mood: i32,
    pub tone: Tone,
    /// 0-1
    pub confidence: f64,
    pub summary: String,
    pub keywords: Vec<String>,
}

impl TextAffect {
    /// Enforce label count and numeric ranges
    pub fn normalized(mut self) -> Self {
        let mut seen = Vec::with_capacity(MAX_EMOTIONS);
        self.emotions.retain(|e| {
            if seen.contains(e) {
                false
            } else {
                seen.push(*e);
                true
            }
        });
        self.emotions.truncate(MAX_EMOTIONS);
        if self.emotions.is_empty() {
            self.emotions.push(Emotion::Neutral);
        }
        self.stress = self.stress.clamp(0, SCORE_MAX);
        self.energy = self.energy.clamp(0, SCORE_MAX);
        self.mood = self.mood.clamp(-MOOD_LIMIT, MOOD_LIMIT);
        self.confidence = if self.confidence.is_finite() {
            self.confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self
    }
}

/// Fused affect: text anchor plus optional voice evidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedAffect {
    #[serde(flatten)]
    pub affect: TextAffect,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<VoiceAnalysis>,
}

impl CombinedAffect {
    /// Voice cues when voice evidence was fused
    pub fn cues(&self) -> Option<&VoiceCues> {
        self.voice.as_ref().map(|v| &v.cues)
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Audio extraction error
///
/// Never crosses the extractor boundary; failures select default features.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// I/O error (temporary file read/write)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Audio decoding failed
    #[error("Audio decoding error: {0}")]
    AudioDecode(String),

    /// Unsupported audio format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Failed to parse tool output
    #[error("Parse error: {0}")]
    Parse(String),

    /// Optional capability not available
    #[error("Extractor not available: {0}")]
    NotAvailable(String),

    /// Internal processing error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure of a primary (external service) strategy
///
/// Always answered by the paired fallback; never surfaces to callers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisFailure {
    /// Capability not configured (no API key, null client)
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Connection or transport error
    #[error("Network error: {0}")]
    Network(String),

    /// Request timed out
    #[error("Request timed out")]
    Timeout,

    /// Service answered with a non-success status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Service answered with no usable content
    #[error("Empty response")]
    EmptyResponse,

    /// Response did not match the expected schema
    #[error("Schema error: {0}")]
    Schema(String),
}

impl AnalysisFailure {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            AnalysisFailure::Network(_) | AnalysisFailure::Timeout => true,
            AnalysisFailure::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

// ============================================================================
// Strategy Composition
// ============================================================================

/// Fallible primary analysis (usually backed by an external service)
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Input type for the analysis; may be unsized (slices, `str`)
    type Input: ?Sized + Send + Sync;
    /// Output type of the analysis
    type Output: Send;

    /// Strategy name for logging
    fn name(&self) -> &'static str;

    /// Attempt the analysis
    ///
    /// # Errors
    /// Any `AnalysisFailure` selects the paired fallback
    async fn attempt(&self, input: &Self::Input) -> Result<Self::Output, AnalysisFailure>;
}

/// Infallible local analysis used when the primary fails
pub trait Fallback: Send + Sync {
    type Input: ?Sized;
    type Output;

    fn name(&self) -> &'static str;

    fn produce(&self, input: &Self::Input) -> Self::Output;
}

/// A primary strategy paired with its fallback
#[derive(Debug, Clone)]
pub struct OrElse<P, F> {
    pub primary: P,
    pub fallback: F,
}

impl<P, F> OrElse<P, F>
where
    P: Strategy,
    F: Fallback<Input = P::Input, Output = P::Output>,
{
    /// Run the primary, answering any failure with the fallback
    pub async fn run(&self, input: &P::Input) -> P::Output {
        match self.primary.attempt(input).await {
            Ok(output) => {
                debug!(strategy = self.primary.name(), "Primary strategy succeeded");
                output
            }
            Err(AnalysisFailure::Unavailable(reason)) => {
                debug!(
                    strategy = self.primary.name(),
                    fallback = self.fallback.name(),
                    reason = %reason,
                    "Primary strategy unavailable, using fallback"
                );
                self.fallback.produce(input)
            }
            Err(e) => {
                warn!(
                    strategy = self.primary.name(),
                    fallback = self.fallback.name(),
                    error = %e,
                    "Primary strategy failed, using fallback"
                );
                self.fallback.produce(input)
            }
        }
    }
}

/// `or_else` combinator for strategies
pub trait StrategyExt: Strategy + Sized {
    fn or_else<F>(self, fallback: F) -> OrElse<Self, F>
    where
        F: Fallback<Input = Self::Input, Output = Self::Output>,
    {
        OrElse {
            primary: self,
            fallback,
        }
    }
}

impl<S: Strategy> StrategyExt for S {}

// ============================================================================
// Tests
// ============================================================================
