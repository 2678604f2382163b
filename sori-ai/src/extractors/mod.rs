//! Audio feature extractors
//!
//! - [`prosody`]: decoded recording → raw acoustic measurements
//! - [`signal`]: frame-level DSP primitives
//! - [`pitch_refiner`]: optional harmonicity/jitter capability

pub mod pitch_refiner;
pub mod prosody;
pub mod signal;

pub use pitch_refiner::{detect_refiner, NullPitchRefiner, PitchRefiner, PraatRefiner, VoiceQuality};
pub use prosody::{ProsodyFeatureExtractor, ProsodyParams};
