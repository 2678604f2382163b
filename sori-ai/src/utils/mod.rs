//! Utility modules for sori-ai

pub mod audio_decoder;
pub mod json_parse;
pub mod retry;

pub use audio_decoder::{decode_audio_bytes, decode_mono_at, encode_wav_16bit, DecodedAudio};
pub use json_parse::{extract_json_object, parse_typed};
pub use retry::{retry_transient, RetryPolicy};
