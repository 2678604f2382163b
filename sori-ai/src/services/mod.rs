//! External service clients
//!
//! Each capability is a trait with a production HTTP client and a null
//! implementation chosen at construction time.

pub mod http;
pub mod llm_client;
pub mod stt_client;

pub use llm_client::{ChatRequest, LanguageModelClient, NullLanguageModel, OpenAiChatClient};
pub use stt_client::{NullSpeechToText, SpeechToTextClient, WhisperClient};
