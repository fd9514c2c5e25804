pub mod comparison;
pub mod error;
pub mod property;
pub mod relationship;
pub mod report;
pub mod schema;

pub use comparison::{
    ChangeKind, ComparisonReport, ComparisonSummary, ContainerChange, Impact, PropertyChange,
    RelationshipChange,
};
pub use error::{MapError, Result, StoreError, StoreErrorCategory};
pub use property::{Optionality, PropertyRecord, ValueType, split_path};
pub use relationship::{
    Cardinality, CardinalityInfo, ConfidenceAnalysis, ConfidenceFactors, ConfidenceLevel,
    DenormalizationInfo, DenormalizationStatus, FactorScore, Relationship,
};
pub use report::{AnalysisReport, ContainerFailure};
pub use schema::{ContainerRef, ContainerSchema, DatabaseCatalog};
