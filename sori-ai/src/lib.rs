//! sori-ai library interface
//!
//! Affect estimation and coaching for voice/text journal entries:
//! - [`extractors`], [`voice`]: recording → raw features → bounded voice cues
//! - [`text`], [`fusion`]: text affect, nudged by voice cues
//! - [`knowledge`]: reference document chunking and similarity search
//! - [`coaching`]: grounded recommendations and weekly reports
//! - [`workflow`]: per-submission orchestration over a [`models::UserSession`]

pub mod coaching;
pub mod config;
pub mod error;
pub mod extractors;
pub mod fusion;
pub mod knowledge;
pub mod models;
pub mod services;
pub mod text;
pub mod types;
pub mod utils;
pub mod voice;
pub mod workflow;

pub use crate::error::{Result, SoriError};
