//! Speech-to-Text Client
//!
//! Transcribes a journal recording when the user did not type any text.
//! Audio is decoded and resampled to the configured rate (16 kHz mono by
//! default) and uploaded as 16-bit WAV to an OpenAI-compatible
//! `POST {base_url}/audio/transcriptions` endpoint. When the recording cannot
//! be decoded locally the original bytes are uploaded unchanged.
//!
//! Transcription never fails from the caller's point of view: `None` means
//! no transcript is available.

use crate::services::http::{build_http_client, endpoint, ensure_success, map_transport_error};
use crate::types::AnalysisFailure;
use crate::utils::{decode_mono_at, encode_wav_16bit, retry_transient, RetryPolicy};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use sori_common::config::{LlmConfig, SpeechConfig};
use std::time::Duration;
use tracing::{debug, warn};

/// Speech-to-text capability
#[async_trait]
pub trait SpeechToTextClient: Send + Sync {
    fn name(&self) -> &'static str;

    /// Transcribe encoded audio; `None` when unavailable or failed
    async fn transcribe(&self, audio: &[u8]) -> Option<String>;
}

/// Client used when no speech-to-text service is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSpeechToText;

#[async_trait]
impl SpeechToTextClient for NullSpeechToText {
    fn name(&self) -> &'static str {
        "null"
    }

    async fn transcribe(&self, _audio: &[u8]) -> Option<String> {
        None
    }
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

/// Prepared upload: file name, MIME type and bytes
#[derive(Debug, Clone, PartialEq)]
struct Upload {
    file_name: &'static str,
    mime: String,
    bytes: Vec<u8>,
}

/// Whisper-style transcription client
pub struct WhisperClient {
    http_client: Client,
    base_url: String,
    api_key: String,
    model: String,
    language: String,
    sample_rate: u32,
    retry: RetryPolicy,
}

impl WhisperClient {
    pub fn new(
        llm: &LlmConfig,
        speech: &SpeechConfig,
        sample_rate: u32,
        api_key: String,
        retry: RetryPolicy,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http_client: build_http_client(Duration::from_secs(llm.timeout_secs))?,
            base_url: llm.base_url.clone(),
            api_key,
            model: speech.model.clone(),
            language: speech.language.clone(),
            sample_rate,
            retry,
        })
    }

    fn prepare(&self, audio: &[u8]) -> Upload {
        let wav = decode_mono_at(audio, self.sample_rate)
            .and_then(|decoded| encode_wav_16bit(&decoded.samples, self.sample_rate));

        match wav {
            Ok(bytes) => Upload {
                file_name: "audio.wav",
                mime: "audio/wav".to_string(),
                bytes,
            },
            Err(e) => {
                debug!(error = %e, "Could not preprocess audio, uploading original bytes");
                let mime = infer::get(audio)
                    .map(|kind| kind.mime_type().to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                Upload {
                    file_name: "audio",
                    mime,
                    bytes: audio.to_vec(),
                }
            }
        }
    }

    async fn send_once(&self, upload: &Upload) -> Result<String, AnalysisFailure> {
        let part = Part::bytes(upload.bytes.clone())
            .file_name(upload.file_name)
            .mime_str(&upload.mime)
            .map_err(|e| AnalysisFailure::Schema(format!("Invalid MIME type: {}", e)))?;

        let form = Form::new()
            .part("file", part)
            .text("model", self.model.clone())
            .text("language", self.language.clone());

        let response = self
            .http_client
            .post(endpoint(&self.base_url, "audio/transcriptions"))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(map_transport_error)?;

        let response = ensure_success(response).await?;
        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| AnalysisFailure::Schema(format!("Invalid transcription response: {}", e)))?;

        let text = parsed.text.trim().to_string();
        if text.is_empty() {
            Err(AnalysisFailure::EmptyResponse)
        } else {
            Ok(text)
        }
    }
}

#[async_trait]
impl SpeechToTextClient for WhisperClient {
    fn name(&self) -> &'static str {
        "whisper"
    }

    async fn transcribe(&self, audio: &[u8]) -> Option<String> {
        if audio.is_empty() {
            return None;
        }
        let upload = self.prepare(audio);
        debug!(
            model = %self.model,
            bytes = upload.bytes.len(),
            mime = %upload.mime,
            "Sending transcription request"
        );

        match retry_transient("transcription", &self.retry, || self.send_once(&upload)).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(error = %e, "Transcription failed");
                None
            }
        }
    }
}
