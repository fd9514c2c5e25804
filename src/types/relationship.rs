//! Relationship Model
//!
//! Directed reference edges between containers, plus the composite
//! confidence analysis attached to each edge after scoring.

use serde::{Deserialize, Serialize};

// =============================================================================
// Cardinality
// =============================================================================

/// Edge cardinality. Candidates are emitted as many-to-one; one-to-many
/// exists only as the inversion. One-to-one appears when an observed
/// cardinality analysis (or external tooling) tightened an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cardinality {
    #[serde(rename = "many-to-one")]
    ManyToOne,
    #[serde(rename = "one-to-many")]
    OneToMany,
    #[serde(rename = "one-to-one")]
    OneToOne,
}

impl Cardinality {
    pub fn inverted(self) -> Self {
        match self {
            Self::ManyToOne => Self::OneToMany,
            Self::OneToMany => Self::ManyToOne,
            Self::OneToOne => Self::OneToOne,
        }
    }
}

impl std::fmt::Display for Cardinality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ManyToOne => write!(f, "many-to-one"),
            Self::OneToMany => write!(f, "one-to-many"),
            Self::OneToOne => write!(f, "one-to-one"),
        }
    }
}

// =============================================================================
// Relationship
// =============================================================================

/// Directed inferred reference between two containers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub from_container: String,
    pub from_database: String,
    /// Path of the referencing property in the source schema
    pub from_property: String,
    pub to_container: String,
    pub to_database: String,
    /// Always `id` on forward edges
    pub to_property: String,
    pub cardinality: Cardinality,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_cross_database: bool,
    /// No target container resolved for the derived name
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_orphan: bool,
    /// Target name matched containers in more than one database
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_ambiguous: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub possible_databases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<ConfidenceAnalysis>,
}

impl Relationship {
    /// Stable identity key: `fromDb.fromContainer.fromProperty -> toDb.toContainer`
    pub fn key(&self) -> String {
        format!(
            "{}.{}.{} -> {}.{}",
            self.from_database,
            self.from_container,
            self.from_property,
            self.to_database,
            self.to_container
        )
    }

    /// Swap endpoints, producing the inverse edge. The forward edge's
    /// target property becomes the source and vice versa, so inverting
    /// twice returns the original.
    pub fn inverted(&self) -> Self {
        Self {
            from_container: self.to_container.clone(),
            from_database: self.to_database.clone(),
            from_property: self.to_property.clone(),
            to_container: self.from_container.clone(),
            to_database: self.from_database.clone(),
            to_property: self.from_property.clone(),
            cardinality: self.cardinality.inverted(),
            is_cross_database: self.is_cross_database,
            is_orphan: self.is_orphan,
            is_ambiguous: self.is_ambiguous,
            possible_databases: self.possible_databases.clone(),
            confidence: self.confidence.clone(),
        }
    }
}

// =============================================================================
// Confidence
// =============================================================================

/// Confidence bands over the composite score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
    VeryLow,
}

impl ConfidenceLevel {
    /// Band thresholds: high >= 80, medium >= 60, low >= 40, else very-low
    pub fn from_score(score: u8) -> Self {
        match score {
            80..=u8::MAX => Self::High,
            60..=79 => Self::Medium,
            40..=59 => Self::Low,
            _ => Self::VeryLow,
        }
    }
}

impl std::fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
            Self::VeryLow => write!(f, "very-low"),
        }
    }
}

/// One scored factor with its explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactorScore {
    /// Sub-score in [0, 100]
    pub score: u8,
    pub reason: String,
    /// True when the factor was computed against the live store
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub validated: bool,
    /// Raw match rate behind a referential-integrity score
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_rate: Option<f64>,
}

impl FactorScore {
    pub fn new(score: u8, reason: impl Into<String>) -> Self {
        Self {
            score,
            reason: reason.into(),
            validated: false,
            match_rate: None,
        }
    }

    pub fn validated(mut self) -> Self {
        self.validated = true;
        self
    }

    pub fn with_match_rate(mut self, rate: f64) -> Self {
        self.match_rate = Some(rate);
        self
    }
}

/// Denormalization verdict for a foreign key's embedded snapshot object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DenormalizationStatus {
    /// Nested object with recognised snapshot fields
    Detected,
    /// Nested object present but no recognised snapshot fields
    Possible,
    /// No nested object under the foreign key's base name
    Absent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DenormalizationInfo {
    pub status: DenormalizationStatus,
    pub confidence: u8,
    /// Snapshot field names found under the nested object
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub snapshot_fields: Vec<String>,
}

impl DenormalizationInfo {
    pub fn is_denormalized(&self) -> bool {
        self.status == DenormalizationStatus::Detected
    }
}

/// Observed cardinality from live foreign-key sampling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardinalityInfo {
    pub observed: Cardinality,
    /// Distinct foreign-key values in the sample
    pub distinct_values: u64,
    /// Highest repeat count of any single value
    pub max_references: u64,
}

/// Factor sub-scores plus informational sub-records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceFactors {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referential_integrity: Option<FactorScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_consistency: Option<FactorScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<FactorScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub naming_pattern: Option<FactorScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub denormalization: Option<DenormalizationInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cardinality: Option<CardinalityInfo>,
}

/// Composite confidence attached to a relationship
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceAnalysis {
    /// Weighted composite in [0, 100]
    pub score: u8,
    pub level: ConfidenceLevel,
    pub factors: ConfidenceFactors,
    /// True iff live integrity sampling was performed
    pub validated: bool,
    /// Human-readable one-line assessment
    pub summary: String,
}

// =============================================================================
// Tests
// =============================================================================
