//! Comparison Model
//!
//! Structural diff between two analysis results: container changes,
//! per-container property changes, relationship changes, and a summary
//! with breaking-change classification.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::relationship::Cardinality;

// =============================================================================
// Change Kinds & Impact
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeKind {
    ContainerAdded,
    ContainerRemoved,
    Added,
    Removed,
    TypeChanged,
    OptionalityChanged,
    FrequencyChanged,
    EnumValuesChanged,
    ComputedChanged,
    RelationshipAdded,
    RelationshipRemoved,
    CardinalityChanged,
    ConfidenceChanged,
}

impl ChangeKind {
    /// Removals of whole entities, classified `critical`
    pub fn is_removal(&self) -> bool {
        matches!(
            self,
            Self::ContainerRemoved | Self::Removed | Self::RelationshipRemoved
        )
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ContainerAdded => "CONTAINER_ADDED",
            Self::ContainerRemoved => "CONTAINER_REMOVED",
            Self::Added => "ADDED",
            Self::Removed => "REMOVED",
            Self::TypeChanged => "TYPE_CHANGED",
            Self::OptionalityChanged => "OPTIONALITY_CHANGED",
            Self::FrequencyChanged => "FREQUENCY_CHANGED",
            Self::EnumValuesChanged => "ENUM_VALUES_CHANGED",
            Self::ComputedChanged => "COMPUTED_CHANGED",
            Self::RelationshipAdded => "RELATIONSHIP_ADDED",
            Self::RelationshipRemoved => "RELATIONSHIP_REMOVED",
            Self::CardinalityChanged => "CARDINALITY_CHANGED",
            Self::ConfidenceChanged => "CONFIDENCE_CHANGED",
        };
        write!(f, "{}", s)
    }
}

/// User-facing severity of a change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    /// Entity removal
    Critical,
    /// Breaking change that is not a removal
    Warning,
    /// Additive or informational
    Info,
}

impl Impact {
    pub fn classify(kind: ChangeKind, breaking: bool) -> Self {
        if kind.is_removal() {
            Self::Critical
        } else if breaking {
            Self::Warning
        } else {
            Self::Info
        }
    }
}

// =============================================================================
// Change Records
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerChange {
    pub kind: ChangeKind,
    /// Schema key: `{database}/{container}`
    pub container: String,
    pub breaking: bool,
    pub impact: Impact,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyChange {
    pub kind: ChangeKind,
    pub path: String,
    pub breaking: bool,
    pub impact: Impact,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipChange {
    pub kind: ChangeKind,
    /// Relationship identity key
    pub relationship: String,
    pub breaking: bool,
    pub impact: Impact,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cardinality_before: Option<Cardinality>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cardinality_after: Option<Cardinality>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_before: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_after: Option<u8>,
}

// =============================================================================
// Comparison Report
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonSummary {
    pub added: u64,
    pub removed: u64,
    pub changed: u64,
    pub breaking_changes: u64,
    pub total_changes: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonReport {
    pub container_changes: Vec<ContainerChange>,
    /// Property changes keyed by schema key, for containers present in both
    pub property_changes: BTreeMap<String, Vec<PropertyChange>>,
    pub relationship_changes: Vec<RelationshipChange>,
    pub summary: ComparisonSummary,
}

impl ComparisonReport {
    pub fn has_breaking_changes(&self) -> bool {
        self.summary.breaking_changes > 0
    }

    /// Recompute the summary from the change lists
    pub fn finalize(&mut self) {
        let mut summary = ComparisonSummary::default();

        let mut tally = |kind: ChangeKind, breaking: bool| {
            summary.total_changes += 1;
            if breaking {
                summary.breaking_changes += 1;
            }
            match kind {
                ChangeKind::ContainerAdded | ChangeKind::Added | ChangeKind::RelationshipAdded => {
                    summary.added += 1
                }
                ChangeKind::ContainerRemoved
                | ChangeKind::Removed
                | ChangeKind::RelationshipRemoved => summary.removed += 1,
                _ => summary.changed += 1,
            }
        };

        for c in &self.container_changes {
            tally(c.kind, c.breaking);
        }
        for changes in self.property_changes.values() {
            for c in changes {
                tally(c.kind, c.breaking);
            }
        }
        for c in &self.relationship_changes {
            tally(c.kind, c.breaking);
        }

        self.summary = summary;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_wire_names() {
        assert_eq!(
            serde_json::to_string(&ChangeKind::ContainerAdded).unwrap(),
            "\"CONTAINER_ADDED\""
        );
        assert_eq!(
            serde_json::to_string(&ChangeKind::TypeChanged).unwrap(),
            "\"TYPE_CHANGED\""
        );
        assert_eq!(ChangeKind::EnumValuesChanged.to_string(), "ENUM_VALUES_CHANGED");
    }

    #[test]
    fn test_impact_classification() {
        assert_eq!(
            Impact::classify(ChangeKind::Removed, true),
            Impact::Critical
        );
        assert_eq!(
            Impact::classify(ChangeKind::TypeChanged, true),
            Impact::Warning
        );
        assert_eq!(Impact::classify(ChangeKind::Added, false), Impact::Info);
    }

    #[test]
    fn test_finalize_summary() {
        let mut report = ComparisonReport::default();
        report.property_changes.insert(
            "db/products".to_string(),
            vec![
                PropertyChange {
                    kind: ChangeKind::Added,
                    path: "newField".to_string(),
                    breaking: false,
                    impact: Impact::Info,
                    description: "added".to_string(),
                    before: None,
                    after: None,
                },
                PropertyChange {
                    kind: ChangeKind::Removed,
                    path: "oldField".to_string(),
                    breaking: true,
                    impact: Impact::Critical,
                    description: "removed".to_string(),
                    before: None,
                    after: None,
                },
            ],
        );
        report.finalize();

        assert_eq!(report.summary.added, 1);
        assert_eq!(report.summary.removed, 1);
        assert_eq!(report.summary.breaking_changes, 1);
        assert_eq!(report.summary.total_changes, 2);
        assert!(report.has_breaking_changes());
    }
}
