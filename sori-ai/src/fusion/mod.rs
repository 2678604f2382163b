// Fusion Module - text anchor + voice evidence
//
// Voice cues adjust the text affect estimate by a bounded, quality-weighted
// amount. See `affect_fuser` for the rule.

pub mod affect_fuser;

pub use affect_fuser::{AffectDelta, FusionEngine, FusionParams};
