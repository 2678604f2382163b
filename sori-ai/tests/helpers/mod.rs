//! Test Helper Utilities
//!
//! Shared utilities for sori-ai integration tests

#![allow(dead_code, unused_imports)]

pub mod audio_generator;
pub mod mock_clients;
pub mod pdf_generator;

pub use audio_generator::{generate_test_wav, ToneConfig};
pub use mock_clients::{FixedTranscript, ScriptedModel};
pub use pdf_generator::generate_test_pdf;
