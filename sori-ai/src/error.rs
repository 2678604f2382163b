//! Error types for sori-ai
//!
//! Analysis failures never surface here: they select a fallback inside the
//! pipeline. These errors cover setup and file access only.

use std::path::PathBuf;
use thiserror::Error;

/// sori-ai error type
#[derive(Debug, Error)]
pub enum SoriError {
    /// Input file or directory does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Invalid request
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP client construction failed
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// sori-common error
    #[error("Common error: {0}")]
    Common(#[from] sori_common::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for sori-ai operations
pub type Result<T> = std::result::Result<T, SoriError>;
