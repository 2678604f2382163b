//! Configuration loading and root folder resolution
//!
//! All settings live in a single TOML file. Every field has a built-in
//! default, so a missing file is not an error: the tools start with defaults
//! and log a warning.
//!
//! # Config File Priority
//!
//! 1. Explicit path (command-line `--config`)
//! 2. `SORI_CONFIG` environment variable
//! 3. `<config_dir>/sori/sori-ai.toml`
//!
//! # API Key Priority
//!
//! 1. `SORI_OPENAI_API_KEY` environment variable
//! 2. `OPENAI_API_KEY` environment variable
//! 3. `[llm] api_key` in the TOML file

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "SORI_CONFIG";

/// Environment variable naming the data root folder
pub const ROOT_FOLDER_ENV_VAR: &str = "SORI_ROOT_FOLDER";

/// API key environment variables, highest priority first
pub const API_KEY_ENV_VARS: [&str; 2] = ["SORI_OPENAI_API_KEY", "OPENAI_API_KEY"];

/// Complete configuration loaded from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Root folder for journal data and knowledge documents (optional)
    ///
    /// If not specified, environment → OS default
    pub root_folder: Option<PathBuf>,

    pub logging: LoggingConfig,
    pub audio: AudioConfig,
    pub knowledge: KnowledgeConfig,
    pub llm: LlmConfig,
    pub speech: SpeechConfig,
    pub retry: RetryConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Audio analysis rates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Rate prosodic features are computed at (Hz)
    #[serde(default = "default_feature_sample_rate")]
    pub feature_sample_rate: u32,

    /// Rate audio is resampled to before transcription (Hz)
    #[serde(default = "default_stt_sample_rate")]
    pub stt_sample_rate: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            feature_sample_rate: default_feature_sample_rate(),
            stt_sample_rate: default_stt_sample_rate(),
        }
    }
}

/// Similarity signature used for knowledge chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureKind {
    /// Sparse TF-IDF vectors with cosine similarity
    #[default]
    TfIdf,
    /// Character trigram sets with Jaccard similarity
    NGram,
}

/// Knowledge indexing and retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Maximum chunk length in characters
    #[serde(default = "default_chunk_max_chars")]
    pub chunk_max_chars: usize,

    /// Characters carried from one chunk into the next
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Number of chunks retrieved per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Upper bound on TF-IDF vocabulary size
    #[serde(default = "default_max_vocabulary")]
    pub max_vocabulary: usize,

    #[serde(default)]
    pub signature: SignatureKind,

    /// Extra documents indexed alongside `<root>/knowledge`
    #[serde(default)]
    pub paths: Vec<PathBuf>,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            chunk_max_chars: default_chunk_max_chars(),
            chunk_overlap: default_chunk_overlap(),
            top_k: default_top_k(),
            max_vocabulary: default_max_vocabulary(),
            signature: SignatureKind::default(),
            paths: Vec::new(),
        }
    }
}

/// Language model endpoint (OpenAI-compatible)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// API key (lowest priority, see module docs)
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_llm_model(),
            timeout_secs: default_timeout_secs(),
            api_key: None,
        }
    }
}

/// Speech-to-text endpoint (shares base URL and key with `[llm]`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    #[serde(default = "default_speech_model")]
    pub model: String,

    #[serde(default = "default_speech_language")]
    pub language: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            model: default_speech_model(),
            language: default_speech_language(),
        }
    }
}

/// Retry policy for external service calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_feature_sample_rate() -> u32 {
    22_050
}

fn default_stt_sample_rate() -> u32 {
    16_000
}

fn default_chunk_max_chars() -> usize {
    1100
}

fn default_chunk_overlap() -> usize {
    180
}

fn default_top_k() -> usize {
    5
}

fn default_max_vocabulary() -> usize {
    4096
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_speech_model() -> String {
    "whisper-1".to_string()
}

fn default_speech_language() -> String {
    "ko".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    8000
}

impl TomlConfig {
    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration following the priority order in the module docs
    ///
    /// An explicitly named file must exist. The default location may be
    /// absent, in which case built-in defaults are used.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from);

        let (path, required) = match (explicit, env_path) {
            (Some(path), _) => (Some(path.to_path_buf()), true),
            (None, Some(path)) => (Some(path), true),
            (None, None) => (default_config_path(), false),
        };

        let Some(path) = path else {
            warn!("Could not determine config directory, using built-in defaults");
            return Ok(Self::default());
        };

        if !path.exists() {
            if required {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            warn!(
                path = %path.display(),
                "Config file not found, using built-in defaults"
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let config = Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        let k = &self.knowledge;
        if k.chunk_max_chars == 0 {
            return Err(Error::Config("knowledge.chunk_max_chars must be positive".into()));
        }
        if k.chunk_overlap >= k.chunk_max_chars {
            return Err(Error::Config(format!(
                "knowledge.chunk_overlap ({}) must be smaller than chunk_max_chars ({})",
                k.chunk_overlap, k.chunk_max_chars
            )));
        }
        if self.audio.feature_sample_rate == 0 || self.audio.stt_sample_rate == 0 {
            return Err(Error::Config("audio sample rates must be positive".into()));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::Config("retry.max_attempts must be at least 1".into()));
        }
        Ok(())
    }

    /// Resolve the language model API key
    ///
    /// Logs a warning when more than one source provides a key; the highest
    /// priority source wins.
    pub fn resolve_api_key(&self) -> Option<String> {
        let mut sources: Vec<(&str, String)> = API_KEY_ENV_VARS
            .iter()
            .filter_map(|name| {
                std::env::var(name)
                    .ok()
                    .filter(|v| !v.trim().is_empty())
                    .map(|v| (*name, v))
            })
            .collect();

        if let Some(key) = self.llm.api_key.as_ref().filter(|v| !v.trim().is_empty()) {
            sources.push(("config file", key.clone()));
        }

        if sources.len() > 1 {
            let names: Vec<&str> = sources.iter().map(|(name, _)| *name).collect();
            warn!(
                sources = ?names,
                "API key found in multiple sources, using {}", names[0]
            );
        }

        let resolved = sources.into_iter().next();
        match &resolved {
            Some((source, _)) => debug!(source, "Resolved API key"),
            None => debug!("No API key configured"),
        }
        resolved.map(|(_, key)| key)
    }
}

/// Root folder resolution:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV_VAR) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &config.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// Default configuration file path for the platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("sori").join("sori-ai.toml"))
}

/// OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("sori"))
        .unwrap_or_else(|| PathBuf::from("./sori_data"))
}
