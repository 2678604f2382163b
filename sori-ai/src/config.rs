//! Service wiring from TOML configuration
//!
//! Each capability gets its production client when the host can provide it
//! and its null implementation otherwise:
//! - language model and speech-to-text: HTTP clients when an API key resolves
//! - pitch refinement: Praat when found on `PATH`

use crate::error::Result;
use crate::extractors::{detect_refiner, ProsodyFeatureExtractor, ProsodyParams};
use crate::knowledge::{find_default_documents, IndexParams, KnowledgeIndexer, Retriever};
use crate::services::{
    LanguageModelClient, NullLanguageModel, NullSpeechToText, OpenAiChatClient,
    SpeechToTextClient, WhisperClient,
};
use crate::utils::RetryPolicy;
use crate::workflow::EntryPipeline;
use sori_common::config::TomlConfig;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// External service clients selected for this run
#[derive(Clone)]
pub struct ServiceClients {
    pub language_model: Arc<dyn LanguageModelClient>,
    pub speech: Arc<dyn SpeechToTextClient>,
}

impl ServiceClients {
    /// Null clients for both capabilities
    pub fn offline() -> Self {
        Self {
            language_model: Arc::new(NullLanguageModel),
            speech: Arc::new(NullSpeechToText),
        }
    }

    /// Build clients from configuration
    ///
    /// # Errors
    /// `Http` when an HTTP client cannot be constructed.
    pub fn from_config(config: &TomlConfig) -> Result<Self> {
        let Some(api_key) = config.resolve_api_key() else {
            info!("No API key configured, using keyword and rule-based fallbacks");
            return Ok(Self::offline());
        };

        let retry = RetryPolicy::from(&config.retry);
        let language_model = OpenAiChatClient::new(&config.llm, api_key.clone(), retry.clone())?;
        let speech = WhisperClient::new(
            &config.llm,
            &config.speech,
            config.audio.stt_sample_rate,
            api_key,
            retry,
        )?;

        info!(
            base_url = %config.llm.base_url,
            model = %config.llm.model,
            speech_model = %config.speech.model,
            "Language model and speech-to-text clients configured"
        );

        Ok(Self {
            language_model: Arc::new(language_model),
            speech: Arc::new(speech),
        })
    }
}

/// Feature extractor at the configured rate with the best available refiner
pub fn build_extractor(config: &TomlConfig) -> ProsodyFeatureExtractor {
    let params = ProsodyParams {
        sample_rate: config.audio.feature_sample_rate,
        ..ProsodyParams::default()
    };
    ProsodyFeatureExtractor::new(params, detect_refiner())
}

pub fn build_indexer(config: &TomlConfig) -> KnowledgeIndexer {
    KnowledgeIndexer::new(IndexParams::from(&config.knowledge))
}

pub fn build_retriever(config: &TomlConfig) -> Retriever {
    Retriever::new(config.knowledge.top_k)
}

/// Entry pipeline with the given clients
pub fn build_pipeline(config: &TomlConfig, clients: ServiceClients) -> EntryPipeline {
    EntryPipeline::new(
        build_extractor(config),
        clients.language_model,
        clients.speech,
        build_retriever(config),
    )
}

/// Reference documents under `<root>/knowledge` plus `[knowledge] paths`
pub fn knowledge_documents(root: &Path, config: &TomlConfig) -> Vec<PathBuf> {
    find_default_documents(root, &config.knowledge.paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use sori_common::config::API_KEY_ENV_VARS;

    fn clear_key_vars() {
        for name in API_KEY_ENV_VARS {
            std::env::remove_var(name);
        }
    }

    #[test]
    #[serial]
    fn test_no_api_key_selects_null_clients() {
        clear_key_vars();
        let clients = ServiceClients::from_config(&TomlConfig::default()).unwrap();
        assert_eq!(clients.language_model.name(), NullLanguageModel.name());
        assert!(!clients.language_model.is_available());
        assert_eq!(clients.speech.name(), NullSpeechToText.name());
    }

    #[test]
    #[serial]
    fn test_api_key_selects_http_clients() {
        clear_key_vars();
        let mut config = TomlConfig::default();
        config.llm.api_key = Some("sk-test".to_string());

        let clients = ServiceClients::from_config(&config).unwrap();
        assert_ne!(clients.language_model.name(), NullLanguageModel.name());
        assert_ne!(clients.speech.name(), NullSpeechToText.name());
    }

    #[test]
    fn test_extractor_uses_configured_rate() {
        let mut config = TomlConfig::default();
        config.audio.feature_sample_rate = 16_000;
        assert_eq!(build_extractor(&config).params().sample_rate, 16_000);
    }

    #[test]
    fn test_retriever_and_indexer_follow_knowledge_section() {
        let mut config = TomlConfig::default();
        config.knowledge.top_k = 3;
        config.knowledge.chunk_max_chars = 400;
        config.knowledge.chunk_overlap = 40;

        assert_eq!(build_retriever(&config).top_k(), 3);
        let indexer = build_indexer(&config);
        assert_eq!(indexer.params().chunk.max_chars, 400);
        assert_eq!(indexer.params().chunk.overlap, 40);
    }
}
