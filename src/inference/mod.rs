//! Schema Inference
//!
//! Pure CPU subsystem: classify single values into type tags and fold
//! sampled documents into per-container property catalogs.

mod classifier;
mod inferrer;

pub use classifier::{CustomPattern, TypeClassifier};
pub use inferrer::{InferenceOptions, SchemaInferrer};
