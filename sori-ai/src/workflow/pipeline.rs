//! Entry Pipeline
//!
//! Orchestrates one submission inside a [`UserSession`].
//!
//! # Error Handling
//! Nothing in the pipeline fails: decoding problems yield default features,
//! missing capabilities are skipped and external failures select the local
//! fallbacks. A submission with no text (typed or transcribed) ends with the
//! explicit [`SubmissionOutcome::NothingToAnalyze`].

use crate::coaching::{derive_action_query, CoachingComposer, MentalState};
use crate::extractors::ProsodyFeatureExtractor;
use crate::fusion::FusionEngine;
use crate::knowledge::{ChunkMatch, Retriever};
use crate::models::{EntryRecord, UserSession};
use crate::services::{LanguageModelClient, SpeechToTextClient};
use crate::text::{TextAffectAnalyzer, TextAffectRequest};
use crate::types::{CombinedAffect, RawAudioFeatures, VoiceAnalysis};
use crate::voice::DimensionMapper;
use sori_common::time::now_kst;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Entries passed to the composer as recent history
pub const HISTORY_ENTRIES: usize = 7;

/// One journal submission
#[derive(Debug, Clone, Default)]
pub struct Submission {
    /// Typed text; may be empty when audio is given
    pub text: String,
    /// Encoded recording
    pub audio: Option<Vec<u8>>,
}

impl Submission {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            audio: None,
        }
    }

    pub fn with_audio(mut self, audio: Vec<u8>) -> Self {
        self.audio = Some(audio);
        self
    }
}

/// Result of one submission
#[derive(Debug, Clone)]
pub enum SubmissionOutcome {
    /// Entry analysed and appended to the session
    Recorded(Box<EntryRecord>),
    /// No text was typed and none could be transcribed; the baseline was
    /// still updated when audio was given
    NothingToAnalyze { voice: Option<VoiceAnalysis> },
}

/// Progress events
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    VoiceAnalyzed { arousal: f64, tension: f64, stability: f64, quality: f64 },
    Transcribed { chars: usize },
    TextAnalyzed { stress: i32, energy: i32, mood: i32 },
    KnowledgeRetrieved { matches: usize },
    Coached { state: MentalState },
    Recorded { entry_id: u64 },
    NothingToAnalyze,
}

/// Pipeline orchestrator
pub struct EntryPipeline {
    extractor: Arc<ProsodyFeatureExtractor>,
    mapper: DimensionMapper,
    speech: Arc<dyn SpeechToTextClient>,
    text_analyzer: TextAffectAnalyzer,
    fusion: FusionEngine,
    retriever: Retriever,
    composer: CoachingComposer,
    event_tx: Option<mpsc::Sender<PipelineEvent>>,
}

impl EntryPipeline {
    pub fn new(
        extractor: ProsodyFeatureExtractor,
        language_model: Arc<dyn LanguageModelClient>,
        speech: Arc<dyn SpeechToTextClient>,
        retriever: Retriever,
    ) -> Self {
        Self {
            extractor: Arc::new(extractor),
            mapper: DimensionMapper::default(),
            speech,
            text_analyzer: TextAffectAnalyzer::new(Arc::clone(&language_model)),
            fusion: FusionEngine::default(),
            retriever,
            composer: CoachingComposer::new(language_model),
            event_tx: None,
        }
    }

    /// Report progress on `event_tx`
    pub fn with_events(mut self, event_tx: mpsc::Sender<PipelineEvent>) -> Self {
        self.event_tx = Some(event_tx);
        self
    }

    /// Features and cues for one recording; updates the session baseline
    pub async fn analyze_voice(&self, session: &mut UserSession, audio: &[u8]) -> VoiceAnalysis {
        let features = self.extract_features(audio.to_vec()).await;
        session.baseline_mut().update(&features);
        let cues = self.mapper.map(&features, session.baseline());

        debug!(
            arousal = cues.arousal,
            tension = cues.tension,
            stability = cues.stability,
            quality = cues.quality,
            baseline_count = session.baseline().count(),
            "Voice cues mapped"
        );
        self.emit_event(PipelineEvent::VoiceAnalyzed {
            arousal: cues.arousal,
            tension: cues.tension,
            stability: cues.stability,
            quality: cues.quality,
        })
        .await;

        VoiceAnalysis { features, cues }
    }

    /// Run one submission to completion
    pub async fn submit(&self, session: &mut UserSession, submission: Submission) -> SubmissionOutcome {
        let Submission { text, audio } = submission;
        info!(
            text_chars = text.chars().count(),
            has_audio = audio.is_some(),
            "Processing journal submission"
        );

        // Stage 1: voice cues
        let voice = match &audio {
            Some(bytes) => Some(self.analyze_voice(session, bytes).await),
            None => None,
        };

        // Stage 2: transcription when nothing was typed
        let mut text = text.trim().to_string();
        if text.is_empty() {
            if let Some(bytes) = &audio {
                match self.speech.transcribe(bytes).await {
                    Some(transcript) if !transcript.trim().is_empty() => {
                        text = transcript.trim().to_string();
                        info!(chars = text.chars().count(), "Using transcript as entry text");
                        self.emit_event(PipelineEvent::Transcribed {
                            chars: text.chars().count(),
                        })
                        .await;
                    }
                    _ => debug!(client = self.speech.name(), "No transcript available"),
                }
            }
        }

        if text.is_empty() {
            info!("Submission has no text to analyze");
            self.emit_event(PipelineEvent::NothingToAnalyze).await;
            return SubmissionOutcome::NothingToAnalyze { voice };
        }

        // Stage 3: text affect
        let request = TextAffectRequest {
            text: text.clone(),
            cues: voice.as_ref().map(|v| v.cues),
        };
        let text_affect = self.text_analyzer.analyze(&request).await;
        self.emit_event(PipelineEvent::TextAnalyzed {
            stress: text_affect.stress,
            energy: text_affect.energy,
            mood: text_affect.mood,
        })
        .await;

        // Stage 4: fusion
        let combined = self.fusion.combine(&text_affect, voice.as_ref());

        // Stage 5: retrieval and coaching
        let retrieved = self.retrieve(session, &text, &combined).await;
        let history: Vec<_> = session
            .recent_entries(HISTORY_ENTRIES)
            .iter()
            .map(EntryRecord::history_point)
            .collect();
        let coaching = self.composer.compose(&text, &combined, &retrieved, &history).await;
        self.emit_event(PipelineEvent::Coached {
            state: coaching.state,
        })
        .await;

        // Stage 6: record
        let entry = EntryRecord::new(
            session.next_entry_id(),
            &now_kst(),
            text,
            combined,
            audio.as_deref(),
            coaching,
        );
        session.push_entry(entry.clone());

        info!(
            entry_id = entry.id,
            state = entry.mental_state.state.label(),
            stress = entry.analysis.affect.stress,
            energy = entry.analysis.affect.energy,
            mood = entry.analysis.affect.mood,
            "Journal entry recorded"
        );
        self.emit_event(PipelineEvent::Recorded { entry_id: entry.id }).await;

        SubmissionOutcome::Recorded(Box::new(entry))
    }

    async fn retrieve(
        &self,
        session: &UserSession,
        text: &str,
        combined: &CombinedAffect,
    ) -> Vec<ChunkMatch> {
        let Some(index) = session.knowledge() else {
            return Vec::new();
        };
        if index.is_empty() {
            return Vec::new();
        }

        let query = derive_action_query(text, combined);
        let matches = self.retriever.search(&query, &index);
        self.emit_event(PipelineEvent::KnowledgeRetrieved {
            matches: matches.len(),
        })
        .await;
        matches
    }

    /// Feature extraction on the blocking pool
    async fn extract_features(&self, audio: Vec<u8>) -> RawAudioFeatures {
        let extractor = Arc::clone(&self.extractor);
        match tokio::task::spawn_blocking(move || extractor.extract(&audio)).await {
            Ok(features) => features,
            Err(e) => {
                warn!(error = %e, "Feature extraction task failed, using default features");
                RawAudioFeatures::default()
            }
        }
    }

    async fn emit_event(&self, event: PipelineEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(event).await;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
