//! Scripted service clients

use async_trait::async_trait;
use sori_ai::services::{ChatRequest, LanguageModelClient, SpeechToTextClient};
use sori_ai::types::AnalysisFailure;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Language model answering from a queue of replies
///
/// Once the queue is empty every call fails as unavailable.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, AnalysisFailure>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<Result<String, AnalysisFailure>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModelClient for ScriptedModel {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String, AnalysisFailure> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AnalysisFailure::Unavailable("script exhausted".into())))
    }
}

/// Speech-to-text returning a fixed transcript
pub struct FixedTranscript(pub Option<String>);

#[async_trait]
impl SpeechToTextClient for FixedTranscript {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn transcribe(&self, _audio: &[u8]) -> Option<String> {
        self.0.clone()
    }
}
