//! Snapshot Comparison
//!
//! Structural diff between two analysis results. Containers are compared
//! by schema key, properties path-by-path within containers present in
//! both, and relationships by identity key. Each change is classified as
//! breaking or additive with a user-facing impact level.
//!
//! Breaking changes: removals, type narrowing (the current type set is a
//! strict subset of the baseline's), required-to-optional downgrades,
//! severe frequency regressions, many-to-one tightening to one-to-one,
//! and confidence collapses.

use std::collections::BTreeSet;

use crate::types::{
    AnalysisReport, Cardinality, ChangeKind, ComparisonReport, ContainerChange, ContainerSchema,
    Impact, PropertyChange, PropertyRecord, Relationship, RelationshipChange, ValueType,
};

/// Frequency delta that counts as a change at all
const FREQUENCY_EPSILON: f64 = 0.10;
/// Frequency collapse that counts as breaking
const FREQUENCY_BREAKING_DROP: f64 = 0.5;
/// Confidence delta that counts as a change
const CONFIDENCE_EPSILON: u8 = 20;
/// Confidence collapse that counts as breaking
const CONFIDENCE_BREAKING_DROP: u8 = 40;

/// Compare two analysis results, baseline against current.
pub fn compare(baseline: &AnalysisReport, current: &AnalysisReport) -> ComparisonReport {
    let mut report = ComparisonReport::default();

    compare_containers(baseline, current, &mut report);
    compare_properties(baseline, current, &mut report);
    compare_relationships(baseline, current, &mut report);

    report.finalize();
    report
}

// =============================================================================
// Containers
// =============================================================================

fn compare_containers(
    baseline: &AnalysisReport,
    current: &AnalysisReport,
    report: &mut ComparisonReport,
) {
    let baseline_keys: BTreeSet<&String> = baseline.schemas.keys().collect();
    let current_keys: BTreeSet<&String> = current.schemas.keys().collect();

    for key in current_keys.difference(&baseline_keys) {
        report.container_changes.push(ContainerChange {
            kind: ChangeKind::ContainerAdded,
            container: (*key).clone(),
            breaking: false,
            impact: Impact::Info,
            description: format!("Container {} appeared", key),
        });
    }
    for key in baseline_keys.difference(&current_keys) {
        report.container_changes.push(ContainerChange {
            kind: ChangeKind::ContainerRemoved,
            container: (*key).clone(),
            breaking: true,
            impact: Impact::Critical,
            description: format!("Container {} disappeared", key),
        });
    }
}

// =============================================================================
// Properties
// =============================================================================

fn compare_properties(
    baseline: &AnalysisReport,
    current: &AnalysisReport,
    report: &mut ComparisonReport,
) {
    for (key, baseline_schema) in &baseline.schemas {
        let Some(current_schema) = current.schemas.get(key) else {
            continue;
        };
        let changes = diff_schema(baseline_schema, current_schema);
        if !changes.is_empty() {
            report.property_changes.insert(key.clone(), changes);
        }
    }
}

fn diff_schema(baseline: &ContainerSchema, current: &ContainerSchema) -> Vec<PropertyChange> {
    let mut changes = Vec::new();

    let paths: BTreeSet<&String> = baseline
        .properties
        .keys()
        .chain(current.properties.keys())
        .collect();

    for path in paths {
        match (baseline.properties.get(path), current.properties.get(path)) {
            (None, Some(_)) => changes.push(property_change(
                ChangeKind::Added,
                path,
                false,
                format!("Property {} appeared", path),
                None,
                None,
            )),
            (Some(_), None) => changes.push(property_change(
                ChangeKind::Removed,
                path,
                true,
                format!("Property {} disappeared", path),
                None,
                None,
            )),
            (Some(before), Some(after)) => diff_property(path, before, after, &mut changes),
            (None, None) => unreachable!("path came from one of the two maps"),
        }
    }

    changes
}

fn diff_property(
    path: &str,
    before: &PropertyRecord,
    after: &PropertyRecord,
    changes: &mut Vec<PropertyChange>,
) {
    let before_types: BTreeSet<ValueType> = before.types.iter().cloned().collect();
    let after_types: BTreeSet<ValueType> = after.types.iter().cloned().collect();

    if before_types != after_types {
        let narrowing = after_types.is_subset(&before_types) && after_types.len() < before_types.len();
        changes.push(property_change(
            ChangeKind::TypeChanged,
            path,
            narrowing,
            format!(
                "Type set changed from [{}] to [{}]",
                join_types(&before_types),
                join_types(&after_types)
            ),
            Some(join_types(&before_types)),
            Some(join_types(&after_types)),
        ));
    }

    let mut optionality_emitted = false;
    if before.is_required != after.is_required {
        optionality_emitted = true;
        let downgraded = before.is_required && !after.is_required;
        changes.push(property_change(
            ChangeKind::OptionalityChanged,
            path,
            downgraded,
            if downgraded {
                format!("Property {} is no longer required", path)
            } else {
                format!("Property {} became required", path)
            },
            Some(requiredness(before.is_required)),
            Some(requiredness(after.is_required)),
        ));
    }

    if (before.frequency - after.frequency).abs() > FREQUENCY_EPSILON {
        let collapsed = after.frequency < before.frequency - FREQUENCY_BREAKING_DROP;
        changes.push(property_change(
            ChangeKind::FrequencyChanged,
            path,
            collapsed,
            format!(
                "Frequency moved from {:.2} to {:.2}",
                before.frequency, after.frequency
            ),
            Some(format!("{:.2}", before.frequency)),
            Some(format!("{:.2}", after.frequency)),
        ));
    }

    if !optionality_emitted && before.optionality != after.optionality {
        let downgraded = before.optionality == Some(crate::types::Optionality::Required)
            && after.optionality != Some(crate::types::Optionality::Required);
        changes.push(property_change(
            ChangeKind::OptionalityChanged,
            path,
            downgraded,
            format!(
                "Optionality changed from {} to {}",
                optionality_label(before),
                optionality_label(after)
            ),
            Some(optionality_label(before)),
            Some(optionality_label(after)),
        ));
    }

    if before.is_enum != after.is_enum || before.enum_values != after.enum_values {
        changes.push(property_change(
            ChangeKind::EnumValuesChanged,
            path,
            false,
            format!("Enum values changed for {}", path),
            before.enum_values.as_ref().map(|v| v.join(", ")),
            after.enum_values.as_ref().map(|v| v.join(", ")),
        ));
    }

    if before.is_computed != after.is_computed || before.computed_pattern != after.computed_pattern
    {
        changes.push(property_change(
            ChangeKind::ComputedChanged,
            path,
            false,
            format!("Computed classification changed for {}", path),
            before.computed_pattern.clone(),
            after.computed_pattern.clone(),
        ));
    }
}

fn property_change(
    kind: ChangeKind,
    path: &str,
    breaking: bool,
    description: String,
    before: Option<String>,
    after: Option<String>,
) -> PropertyChange {
    PropertyChange {
        kind,
        path: path.to_string(),
        breaking,
        impact: Impact::classify(kind, breaking),
        description,
        before,
        after,
    }
}

fn join_types(types: &BTreeSet<ValueType>) -> String {
    types
        .iter()
        .map(ValueType::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn requiredness(required: bool) -> String {
    if required { "required" } else { "optional" }.to_string()
}

fn optionality_label(record: &PropertyRecord) -> String {
    record
        .optionality
        .map(|o| o.to_string())
        .unwrap_or_else(|| "unclassified".to_string())
}

// =============================================================================
// Relationships
// =============================================================================

fn compare_relationships(
    baseline: &AnalysisReport,
    current: &AnalysisReport,
    report: &mut ComparisonReport,
) {
    let baseline_keyed: Vec<(String, &Relationship)> = baseline
        .relationships
        .iter()
        .map(|r| (r.key(), r))
        .collect();
    let current_keyed: Vec<(String, &Relationship)> = current
        .relationships
        .iter()
        .map(|r| (r.key(), r))
        .collect();
    let baseline_keys: BTreeSet<&String> = baseline_keyed.iter().map(|(k, _)| k).collect();
    let current_keys: BTreeSet<&String> = current_keyed.iter().map(|(k, _)| k).collect();

    for (key, _) in &current_keyed {
        if !baseline_keys.contains(key) {
            report.relationship_changes.push(RelationshipChange {
                kind: ChangeKind::RelationshipAdded,
                relationship: key.clone(),
                breaking: false,
                impact: Impact::Info,
                description: format!("Relationship {} appeared", key),
                cardinality_before: None,
                cardinality_after: None,
                score_before: None,
                score_after: None,
            });
        }
    }
    for (key, _) in &baseline_keyed {
        if !current_keys.contains(key) {
            report.relationship_changes.push(RelationshipChange {
                kind: ChangeKind::RelationshipRemoved,
                relationship: key.clone(),
                breaking: true,
                impact: Impact::Critical,
                description: format!("Relationship {} disappeared", key),
                cardinality_before: None,
                cardinality_after: None,
                score_before: None,
                score_after: None,
            });
        }
    }

    for (key, before) in &baseline_keyed {
        let Some((_, after)) = current_keyed.iter().find(|(k, _)| k == key) else {
            continue;
        };

        if before.cardinality != after.cardinality {
            let tightened = before.cardinality == Cardinality::ManyToOne
                && after.cardinality == Cardinality::OneToOne;
            report.relationship_changes.push(RelationshipChange {
                kind: ChangeKind::CardinalityChanged,
                relationship: key.clone(),
                breaking: tightened,
                impact: Impact::classify(ChangeKind::CardinalityChanged, tightened),
                description: format!(
                    "Cardinality changed from {} to {}",
                    before.cardinality, after.cardinality
                ),
                cardinality_before: Some(before.cardinality),
                cardinality_after: Some(after.cardinality),
                score_before: None,
                score_after: None,
            });
        }

        if let (Some(before_conf), Some(after_conf)) = (&before.confidence, &after.confidence) {
            let delta = before_conf.score.abs_diff(after_conf.score);
            if delta > CONFIDENCE_EPSILON {
                let collapsed = before_conf.score > after_conf.score
                    && before_conf.score - after_conf.score > CONFIDENCE_BREAKING_DROP;
                report.relationship_changes.push(RelationshipChange {
                    kind: ChangeKind::ConfidenceChanged,
                    relationship: key.clone(),
                    breaking: collapsed,
                    impact: Impact::classify(ChangeKind::ConfidenceChanged, collapsed),
                    description: format!(
                        "Confidence moved from {} to {}",
                        before_conf.score, after_conf.score
                    ),
                    cardinality_before: None,
                    cardinality_after: None,
                    score_before: Some(before_conf.score),
                    score_after: Some(after_conf.score),
                });
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::{InferenceOptions, SchemaInferrer, TypeClassifier};
    use crate::types::{ConfidenceAnalysis, ConfidenceFactors, ConfidenceLevel, DatabaseCatalog};
    use chrono::Utc;
    use serde_json::{Value, json};
    use std::collections::BTreeMap;

    fn report_with(containers: Vec<(&str, Vec<Value>)>) -> AnalysisReport {
        let inferrer = SchemaInferrer::new(TypeClassifier::new(), InferenceOptions::default());
        let schemas: BTreeMap<String, ContainerSchema> = containers
            .iter()
            .map(|(key, docs)| (key.to_string(), inferrer.infer(docs)))
            .collect();
        AnalysisReport {
            databases: vec![DatabaseCatalog::new(
                "db",
                schemas
                    .keys()
                    .map(|k| k.split('/').next_back().unwrap().to_string())
                    .collect(),
            )],
            schemas,
            relationships: Vec::new(),
            timestamp: Utc::now(),
            sample_size: 100,
            failures: Vec::new(),
        }
    }

    fn simple_rel(from_property: &str, cardinality: Cardinality, score: u8) -> Relationship {
        Relationship {
            from_container: "orders".to_string(),
            from_database: "db".to_string(),
            from_property: from_property.to_string(),
            to_container: "stores".to_string(),
            to_database: "db".to_string(),
            to_property: "id".to_string(),
            cardinality,
            is_cross_database: false,
            is_orphan: false,
            is_ambiguous: false,
            possible_databases: Vec::new(),
            confidence: Some(ConfidenceAnalysis {
                score,
                level: ConfidenceLevel::from_score(score),
                factors: ConfidenceFactors::default(),
                validated: false,
                summary: String::new(),
            }),
        }
    }

    #[test]
    fn test_identity_diff_is_empty() {
        let report = report_with(vec![(
            "db/products",
            vec![json!({"id": "1", "name": "x"})],
        )]);
        let comparison = compare(&report, &report);
        assert_eq!(comparison.summary.total_changes, 0);
        assert!(!comparison.has_breaking_changes());
    }

    #[test]
    fn test_added_and_removed_properties() {
        let baseline = report_with(vec![(
            "db/products",
            vec![json!({"id": "1", "oldField": "x"})],
        )]);
        let current = report_with(vec![(
            "db/products",
            vec![json!({"id": "1", "newField": "y"})],
        )]);

        let comparison = compare(&baseline, &current);
        let changes = &comparison.property_changes["db/products"];

        let added: Vec<_> = changes
            .iter()
            .filter(|c| c.kind == ChangeKind::Added)
            .collect();
        let removed: Vec<_> = changes
            .iter()
            .filter(|c| c.kind == ChangeKind::Removed)
            .collect();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].path, "newField");
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].path, "oldField");
        assert_eq!(removed[0].impact, Impact::Critical);

        assert_eq!(comparison.summary.breaking_changes, 1);
        assert_eq!(comparison.summary.total_changes, 2);
    }

    #[test]
    fn test_diff_antisymmetry_for_adds_removes() {
        let a = report_with(vec![("db/products", vec![json!({"id": "1", "a": 1})])]);
        let b = report_with(vec![(
            "db/products",
            vec![json!({"id": "1", "a": 1, "b": 2, "c": 3})],
        )]);

        let forward = compare(&a, &b);
        let backward = compare(&b, &a);
        assert_eq!(forward.summary.added, backward.summary.removed);
        assert_eq!(forward.summary.removed, backward.summary.added);
    }

    #[test]
    fn test_type_narrowing_is_breaking_widening_is_not() {
        let narrow = report_with(vec![("db/c", vec![json!({"v": "s"})])]);
        let wide = report_with(vec![("db/c", vec![json!({"v": "s"}), json!({"v": 1})])]);

        // widening: string -> {string, integer}
        let widened = compare(&narrow, &wide);
        let change = &widened.property_changes["db/c"]
            .iter()
            .find(|c| c.kind == ChangeKind::TypeChanged)
            .unwrap();
        assert!(!change.breaking);

        // narrowing: {string, integer} -> string
        let narrowed = compare(&wide, &narrow);
        let change = &narrowed.property_changes["db/c"]
            .iter()
            .find(|c| c.kind == ChangeKind::TypeChanged)
            .unwrap();
        assert!(change.breaking);
        assert_eq!(change.impact, Impact::Warning);
    }

    #[test]
    fn test_required_to_optional_is_breaking() {
        let baseline = report_with(vec![("db/c", vec![json!({"v": 1}), json!({"v": 2})])]);
        let current = report_with(vec![(
            "db/c",
            vec![json!({"v": 1}), json!({"x": 1}), json!({"x": 2})],
        )]);

        let comparison = compare(&baseline, &current);
        let change = comparison.property_changes["db/c"]
            .iter()
            .find(|c| c.kind == ChangeKind::OptionalityChanged)
            .unwrap();
        assert!(change.breaking);
    }

    #[test]
    fn test_container_add_remove() {
        let baseline = report_with(vec![("db/old", vec![json!({"id": "1"})])]);
        let current = report_with(vec![("db/new", vec![json!({"id": "1"})])]);

        let comparison = compare(&baseline, &current);
        assert_eq!(comparison.container_changes.len(), 2);
        let removed = comparison
            .container_changes
            .iter()
            .find(|c| c.kind == ChangeKind::ContainerRemoved)
            .unwrap();
        assert_eq!(removed.container, "db/old");
        assert_eq!(removed.impact, Impact::Critical);
    }

    #[test]
    fn test_relationship_add_remove_and_changes() {
        let mut baseline = report_with(vec![("db/orders", vec![json!({"id": "1"})])]);
        let mut current = baseline.clone();

        baseline.relationships = vec![
            simple_rel("StoreId", Cardinality::ManyToOne, 90),
            simple_rel("GoneId", Cardinality::ManyToOne, 50),
        ];
        current.relationships = vec![
            simple_rel("StoreId", Cardinality::OneToOne, 40),
            simple_rel("FreshId", Cardinality::ManyToOne, 70),
        ];

        let comparison = compare(&baseline, &current);

        let kinds: Vec<ChangeKind> = comparison
            .relationship_changes
            .iter()
            .map(|c| c.kind)
            .collect();
        assert!(kinds.contains(&ChangeKind::RelationshipAdded));
        assert!(kinds.contains(&ChangeKind::RelationshipRemoved));
        assert!(kinds.contains(&ChangeKind::CardinalityChanged));
        assert!(kinds.contains(&ChangeKind::ConfidenceChanged));

        let cardinality = comparison
            .relationship_changes
            .iter()
            .find(|c| c.kind == ChangeKind::CardinalityChanged)
            .unwrap();
        assert!(cardinality.breaking, "many-to-one to one-to-one tightens");

        let confidence = comparison
            .relationship_changes
            .iter()
            .find(|c| c.kind == ChangeKind::ConfidenceChanged)
            .unwrap();
        assert!(confidence.breaking, "drop of 50 exceeds the breaking bar");
    }

    #[test]
    fn test_small_confidence_drift_ignored() {
        let mut baseline = report_with(vec![("db/orders", vec![json!({"id": "1"})])]);
        let mut current = baseline.clone();
        baseline.relationships = vec![simple_rel("StoreId", Cardinality::ManyToOne, 80)];
        current.relationships = vec![simple_rel("StoreId", Cardinality::ManyToOne, 65)];

        let comparison = compare(&baseline, &current);
        assert!(comparison.relationship_changes.is_empty());
    }

    #[test]
    fn test_frequency_change_thresholds() {
        let baseline = report_with(vec![(
            "db/c",
            (0..10).map(|_| json!({"id": "x", "v": 1})).collect(),
        )]);
        // frequency drops 1.0 -> 0.3
        let current = report_with(vec![(
            "db/c",
            (0..10)
                .map(|i| {
                    if i < 3 {
                        json!({"id": "x", "v": 1})
                    } else {
                        json!({"id": "x"})
                    }
                })
                .collect(),
        )]);

        let comparison = compare(&baseline, &current);
        let change = comparison.property_changes["db/c"]
            .iter()
            .find(|c| c.kind == ChangeKind::FrequencyChanged)
            .unwrap();
        assert!(change.breaking, "drop of 0.7 exceeds the breaking bar");
    }
}
