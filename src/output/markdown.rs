//! Markdown Report
//!
//! Per-database sections with per-container property tables, a
//! relationship table with confidence badges, per-container failure notes,
//! and a comparison appendix when a diff was requested.

use std::fmt::Write;

use crate::types::{AnalysisReport, ComparisonReport, Relationship};

pub fn render_markdown(report: &AnalysisReport, comparison: Option<&ComparisonReport>) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# Document Store Schema Map");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Generated {} from a sample of {} documents per container.",
        report.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
        report.sample_size
    );
    let _ = writeln!(out);

    render_summary(&mut out, report);

    for database in &report.databases {
        let _ = writeln!(out, "## Database `{}`", database.name);
        let _ = writeln!(out);
        for container in database.container_refs() {
            let Some(schema) = report.schema_for(&container) else {
                continue;
            };
            let _ = writeln!(
                out,
                "### `{}` ({} documents sampled)",
                container.name, schema.document_count
            );
            let _ = writeln!(out);
            let _ = writeln!(out, "| Property | Types | Frequency | Required | Examples |");
            let _ = writeln!(out, "|---|---|---|---|---|");
            for property in AnalysisReport::ordered_properties(schema) {
                let types: Vec<&str> = property.types.iter().map(|t| t.as_str()).collect();
                let _ = writeln!(
                    out,
                    "| `{}` | {} | {:.0}% | {} | {} |",
                    property.path,
                    types.join(", "),
                    property.frequency * 100.0,
                    if property.is_required { "yes" } else { "" },
                    escape_cell(&property.examples.join("; ")),
                );
            }
            let _ = writeln!(out);
        }
    }

    render_relationships(&mut out, report);
    render_failures(&mut out, report);

    if let Some(comparison) = comparison {
        render_comparison(&mut out, comparison);
    }

    out
}

fn render_summary(out: &mut String, report: &AnalysisReport) {
    let _ = writeln!(out, "| | |");
    let _ = writeln!(out, "|---|---|");
    let _ = writeln!(out, "| Databases | {} |", report.databases.len());
    let _ = writeln!(out, "| Containers | {} |", report.container_count());
    let _ = writeln!(out, "| Relationships | {} |", report.relationships.len());
    if !report.failures.is_empty() {
        let _ = writeln!(out, "| Failed containers | {} |", report.failures.len());
    }
    let _ = writeln!(out);
}

fn render_relationships(out: &mut String, report: &AnalysisReport) {
    if report.relationships.is_empty() {
        return;
    }
    let _ = writeln!(out, "## Relationships");
    let _ = writeln!(out);
    let _ = writeln!(out, "| From | Property | To | Confidence | Notes |");
    let _ = writeln!(out, "|---|---|---|---|---|");
    for relationship in report.ordered_relationships() {
        let _ = writeln!(
            out,
            "| {}.{} | `{}` | {}.{} | {} | {} |",
            relationship.from_database,
            relationship.from_container,
            relationship.from_property,
            relationship.to_database,
            relationship.to_container,
            confidence_badge(relationship),
            relationship_notes(relationship),
        );
    }
    let _ = writeln!(out);
}

fn confidence_badge(relationship: &Relationship) -> String {
    match &relationship.confidence {
        Some(confidence) => format!("{} ({})", confidence.score, confidence.level),
        None => "unscored".to_string(),
    }
}

fn relationship_notes(relationship: &Relationship) -> String {
    let mut notes = Vec::new();
    if relationship.is_orphan {
        notes.push("orphan".to_string());
    }
    if relationship.is_cross_database {
        notes.push("cross-database".to_string());
    }
    if relationship.is_ambiguous {
        notes.push(format!(
            "ambiguous ({})",
            relationship.possible_databases.join(", ")
        ));
    }
    notes.join(", ")
}

fn render_failures(out: &mut String, report: &AnalysisReport) {
    if report.failures.is_empty() {
        return;
    }
    let _ = writeln!(out, "## Skipped Containers");
    let _ = writeln!(out);
    for failure in &report.failures {
        let _ = writeln!(
            out,
            "- `{}/{}`: {}",
            failure.database, failure.container, failure.message
        );
    }
    let _ = writeln!(out);
}

fn render_comparison(out: &mut String, comparison: &ComparisonReport) {
    let _ = writeln!(out, "## Changes Since Baseline");
    let _ = writeln!(out);
    let summary = &comparison.summary;
    let _ = writeln!(
        out,
        "{} changes ({} added, {} removed, {} changed, **{} breaking**)",
        summary.total_changes, summary.added, summary.removed, summary.changed,
        summary.breaking_changes
    );
    let _ = writeln!(out);

    for change in &comparison.container_changes {
        let _ = writeln!(out, "- {} {}: {}", impact_marker(change.breaking), change.kind, change.description);
    }
    for (container, changes) in &comparison.property_changes {
        let _ = writeln!(out, "- `{}`:", container);
        for change in changes {
            let _ = writeln!(
                out,
                "  - {} {}: {}",
                impact_marker(change.breaking),
                change.kind,
                change.description
            );
        }
    }
    for change in &comparison.relationship_changes {
        let _ = writeln!(
            out,
            "- {} {}: {}",
            impact_marker(change.breaking),
            change.kind,
            change.description
        );
    }
    let _ = writeln!(out);
}

fn impact_marker(breaking: bool) -> &'static str {
    if breaking { "**[breaking]**" } else { "" }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare;
    use crate::inference::{InferenceOptions, SchemaInferrer, TypeClassifier};
    use crate::types::{ContainerSchema, DatabaseCatalog};
    use chrono::Utc;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn report() -> AnalysisReport {
        let inferrer = SchemaInferrer::new(TypeClassifier::new(), InferenceOptions::default());
        let mut schemas: BTreeMap<String, ContainerSchema> = BTreeMap::new();
        schemas.insert(
            "shop/orders".to_string(),
            inferrer.infer(&[json!({"id": "1", "StoreId": "s1", "Total": 9.5})]),
        );
        AnalysisReport {
            databases: vec![DatabaseCatalog::new("shop", vec!["orders".to_string()])],
            schemas,
            relationships: Vec::new(),
            timestamp: Utc::now(),
            sample_size: 25,
            failures: Vec::new(),
        }
    }

    #[test]
    fn test_markdown_contains_tables() {
        let md = render_markdown(&report(), None);
        assert!(md.contains("# Document Store Schema Map"));
        assert!(md.contains("## Database `shop`"));
        assert!(md.contains("| Property | Types | Frequency | Required | Examples |"));
        assert!(md.contains("| `StoreId` |"));
        // id sorts first in the property table
        let id_pos = md.find("| `id` |").unwrap();
        let store_pos = md.find("| `StoreId` |").unwrap();
        assert!(id_pos < store_pos);
    }

    #[test]
    fn test_comparison_appendix() {
        let baseline = report();
        let current = report();
        let diff = compare::compare(&baseline, &current);
        let md = render_markdown(&current, Some(&diff));
        assert!(md.contains("## Changes Since Baseline"));
        assert!(md.contains("0 changes"));
    }
}
