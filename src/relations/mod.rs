//! Relationship Analysis
//!
//! Detects candidate references between containers from naming patterns
//! and structural tags, then scores each candidate with a weighted
//! confidence composite.

mod confidence;
mod detector;

pub use confidence::{
    ConfidenceCalculator, ConfidenceOptions, ConfidenceWeights, analyze_denormalization,
    composite_score,
};
pub use detector::{RelationshipDetector, inversions, unique_for_erd};
