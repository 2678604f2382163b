//! Entry workflow
//!
//! One journal submission runs to completion through these stages:
//! 1. Voice cues (feature extraction, baseline update, dimension mapping)
//! 2. Transcription when only audio was given
//! 3. Text affect analysis with voice cues as an advisory hint
//! 4. Fusion
//! 5. Knowledge retrieval and coaching
//! 6. Entry record appended to the session

pub mod pipeline;

pub use pipeline::{EntryPipeline, PipelineEvent, Submission, SubmissionOutcome};
