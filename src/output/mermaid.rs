//! Mermaid ERD
//!
//! Emits an `erDiagram` block: one entity per container with its
//! root-level attributes, one edge per ERD-unique relationship.

use std::fmt::Write;

use crate::relations::unique_for_erd;
use crate::types::{AnalysisReport, Cardinality};

pub fn render_mermaid(report: &AnalysisReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "erDiagram");

    for container in report.catalog() {
        let Some(schema) = report.schema_for(&container) else {
            continue;
        };
        let _ = writeln!(out, "    {} {{", entity_name(&container.name));
        for property in AnalysisReport::ordered_properties(schema) {
            if property.parent_path.is_some() {
                continue;
            }
            let type_name = property
                .types
                .first()
                .map(|t| t.as_str().replace([' ', '-'], "_"))
                .unwrap_or_else(|| "unknown".to_string());
            let _ = writeln!(
                out,
                "        {} {}{}",
                type_name,
                attribute_name(&property.path),
                if property.path == "id" { " PK" } else { "" }
            );
        }
        let _ = writeln!(out, "    }}");
    }

    for relationship in unique_for_erd(&report.relationships) {
        let connector = match relationship.cardinality {
            Cardinality::ManyToOne => "}o--||",
            Cardinality::OneToMany => "||--o{",
            Cardinality::OneToOne => "||--||",
        };
        let _ = writeln!(
            out,
            "    {} {} {} : \"{}\"",
            entity_name(&relationship.from_container),
            connector,
            entity_name(&relationship.to_container),
            relationship.from_property
        );
    }

    out
}

/// Mermaid entity identifiers cannot contain spaces or dashes
fn entity_name(name: &str) -> String {
    name.replace([' ', '-'], "_").to_uppercase()
}

fn attribute_name(path: &str) -> String {
    path.replace(['[', ']', ' ', '-', '.'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::{InferenceOptions, SchemaInferrer, TypeClassifier};
    use crate::types::{ConfidenceAnalysis, ContainerSchema, DatabaseCatalog, Relationship};
    use chrono::Utc;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn report() -> AnalysisReport {
        let inferrer = SchemaInferrer::new(TypeClassifier::new(), InferenceOptions::default());
        let mut schemas: BTreeMap<String, ContainerSchema> = BTreeMap::new();
        schemas.insert(
            "shop/orders".to_string(),
            inferrer.infer(&[json!({"id": "1", "StoreId": "s1"})]),
        );
        schemas.insert(
            "shop/stores".to_string(),
            inferrer.infer(&[json!({"id": "s1", "Name": "Main"})]),
        );

        let relationship = Relationship {
            from_container: "orders".to_string(),
            from_database: "shop".to_string(),
            from_property: "StoreId".to_string(),
            to_container: "stores".to_string(),
            to_database: "shop".to_string(),
            to_property: "id".to_string(),
            cardinality: crate::types::Cardinality::ManyToOne,
            is_cross_database: false,
            is_orphan: false,
            is_ambiguous: false,
            possible_databases: Vec::new(),
            confidence: None::<ConfidenceAnalysis>,
        };

        AnalysisReport {
            databases: vec![DatabaseCatalog::new(
                "shop",
                vec!["orders".to_string(), "stores".to_string()],
            )],
            schemas,
            relationships: vec![relationship],
            timestamp: Utc::now(),
            sample_size: 10,
            failures: Vec::new(),
        }
    }

    #[test]
    fn test_er_diagram_structure() {
        let mmd = render_mermaid(&report());
        assert!(mmd.starts_with("erDiagram"));
        assert!(mmd.contains("ORDERS {"));
        assert!(mmd.contains("STORES {"));
        assert!(mmd.contains("string id PK"));
        assert!(mmd.contains("ORDERS }o--|| STORES : \"StoreId\""));
    }

    #[test]
    fn test_orphans_excluded() {
        let mut r = report();
        r.relationships[0].is_orphan = true;
        let mmd = render_mermaid(&r);
        assert!(!mmd.contains("}o--||"));
    }
}
