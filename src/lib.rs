//! CosmoMap - Document Store Schema & Relationship Mapper
//!
//! Analyses a Cosmos-style schemaless document store and produces a
//! structured description of its implicit schema: per-container property
//! catalogs with inferred value types, cross-container reference detection
//! with composite confidence scores, and snapshot-to-snapshot evolution
//! reports.
//!
//! ## Core Pipeline
//!
//! 1. **Classify**: map each sampled value to a type tag
//! 2. **Infer**: fold documents into per-container property catalogs
//! 3. **Detect**: derive candidate references from naming patterns and
//!    structural tags
//! 4. **Score**: aggregate referential integrity, type consistency,
//!    frequency, and naming strength into a confidence composite
//! 5. **Compare**: diff two results and classify breaking changes
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use cosmomap::pipeline::{AnalysisPipeline, PipelineOptions};
//! use cosmomap::store::{CosmosClient, CosmosClientConfig};
//!
//! let client = CosmosClient::new(config)?;
//! let pipeline = AnalysisPipeline::new(Arc::new(client), PipelineOptions::default());
//! let report = pipeline.run().await?;
//! ```
//!
//! ## Modules
//!
//! - [`inference`]: value classification and schema inference
//! - [`relations`]: relationship detection and confidence scoring
//! - [`compare`]: structural diff with breaking-change classification
//! - [`snapshot`]: immutable result snapshots on disk
//! - [`store`]: document-store collaborators (REST client, memory fixture)
//! - [`output`]: markdown / HTML / Mermaid / JSON Schema renderers

pub mod cli;
pub mod compare;
pub mod config;
pub mod inference;
pub mod output;
pub mod pipeline;
pub mod relations;
pub mod snapshot;
pub mod store;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader};

// Error Types
pub use types::{MapError, Result};

// Data Model
pub use types::{
    AnalysisReport, Cardinality, ComparisonReport, ConfidenceAnalysis, ConfidenceLevel,
    ContainerRef, ContainerSchema, DatabaseCatalog, PropertyRecord, Relationship, ValueType,
};

// =============================================================================
// Engine Re-exports
// =============================================================================

pub use inference::{InferenceOptions, SchemaInferrer, TypeClassifier};
pub use pipeline::{AnalysisPipeline, CancelFlag, PipelineOptions};
pub use relations::{
    ConfidenceCalculator, ConfidenceOptions, RelationshipDetector, inversions, unique_for_erd,
};
pub use snapshot::{Snapshot, SnapshotStore};
pub use store::{CosmosClient, CosmosClientConfig, DocumentStore, MemoryStore};
