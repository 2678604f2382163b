//! Voice cue pipeline: baseline tracking and dimension mapping

pub mod baseline;
pub mod dimensions;

pub use baseline::{BaselineField, BaselineTracker, MAX_BASELINE_COUNT};
pub use dimensions::{DimensionMapper, DimensionParams};
