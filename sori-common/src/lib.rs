//! # Sori Common Library
//!
//! Shared code for the sori journal tools:
//! - Error types
//! - TOML configuration loading and root folder resolution
//! - Logging setup
//! - Korea Standard Time date/time helpers

pub mod config;
pub mod error;
pub mod logging;
pub mod time;

pub use error::{Error, Result};
