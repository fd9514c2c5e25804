//! HTML Report
//!
//! Self-contained page with inline styling; mirrors the markdown report's
//! structure. No external assets.

use std::fmt::Write;

use crate::types::{AnalysisReport, ComparisonReport, Impact};

const STYLE: &str = r#"
body { font-family: -apple-system, 'Segoe UI', sans-serif; margin: 2rem auto; max-width: 70rem; color: #1a1a2e; }
h1 { border-bottom: 2px solid #4361ee; padding-bottom: .3rem; }
h2 { margin-top: 2rem; color: #3a0ca3; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid #d0d0e0; padding: .4rem .6rem; text-align: left; font-size: .9rem; }
th { background: #f0f1fa; }
code { background: #f5f5fa; padding: .1rem .3rem; border-radius: 3px; }
.badge { border-radius: 3px; padding: .1rem .4rem; font-size: .8rem; color: #fff; }
.high { background: #2a9d8f; } .medium { background: #e9c46a; color: #333; }
.low { background: #f4a261; } .very-low { background: #e76f51; }
.breaking { color: #d62828; font-weight: bold; }
"#;

pub fn render_html(report: &AnalysisReport, comparison: Option<&ComparisonReport>) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "<!DOCTYPE html>");
    let _ = writeln!(out, "<html lang=\"en\"><head><meta charset=\"utf-8\">");
    let _ = writeln!(out, "<title>Document Store Schema Map</title>");
    let _ = writeln!(out, "<style>{}</style></head><body>", STYLE);
    let _ = writeln!(out, "<h1>Document Store Schema Map</h1>");
    let _ = writeln!(
        out,
        "<p>Generated {} from a sample of {} documents per container.</p>",
        report.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
        report.sample_size
    );

    for database in &report.databases {
        let _ = writeln!(out, "<h2>Database <code>{}</code></h2>", escape(&database.name));
        for container in database.container_refs() {
            let Some(schema) = report.schema_for(&container) else {
                continue;
            };
            let _ = writeln!(
                out,
                "<h3><code>{}</code> ({} documents)</h3>",
                escape(&container.name),
                schema.document_count
            );
            let _ = writeln!(
                out,
                "<table><tr><th>Property</th><th>Types</th><th>Frequency</th><th>Required</th><th>Examples</th></tr>"
            );
            for property in AnalysisReport::ordered_properties(schema) {
                let types: Vec<&str> = property.types.iter().map(|t| t.as_str()).collect();
                let _ = writeln!(
                    out,
                    "<tr><td><code>{}</code></td><td>{}</td><td>{:.0}%</td><td>{}</td><td>{}</td></tr>",
                    escape(&property.path),
                    escape(&types.join(", ")),
                    property.frequency * 100.0,
                    if property.is_required { "yes" } else { "" },
                    escape(&property.examples.join("; ")),
                );
            }
            let _ = writeln!(out, "</table>");
        }
    }

    if !report.relationships.is_empty() {
        let _ = writeln!(out, "<h2>Relationships</h2>");
        let _ = writeln!(
            out,
            "<table><tr><th>From</th><th>Property</th><th>To</th><th>Confidence</th></tr>"
        );
        for relationship in report.ordered_relationships() {
            let badge = match &relationship.confidence {
                Some(c) => format!(
                    "<span class=\"badge {}\">{} {}</span>",
                    c.level, c.score, c.level
                ),
                None => String::new(),
            };
            let _ = writeln!(
                out,
                "<tr><td>{}.{}</td><td><code>{}</code></td><td>{}.{}</td><td>{}</td></tr>",
                escape(&relationship.from_database),
                escape(&relationship.from_container),
                escape(&relationship.from_property),
                escape(&relationship.to_database),
                escape(&relationship.to_container),
                badge,
            );
        }
        let _ = writeln!(out, "</table>");
    }

    if let Some(comparison) = comparison {
        render_comparison(&mut out, comparison);
    }

    let _ = writeln!(out, "</body></html>");
    out
}

fn render_comparison(out: &mut String, comparison: &ComparisonReport) {
    let _ = writeln!(out, "<h2>Changes Since Baseline</h2>");
    let summary = &comparison.summary;
    let _ = writeln!(
        out,
        "<p>{} changes ({} added, {} removed, {} changed, <span class=\"breaking\">{} breaking</span>)</p>",
        summary.total_changes, summary.added, summary.removed, summary.changed,
        summary.breaking_changes
    );

    let _ = writeln!(out, "<ul>");
    for change in &comparison.container_changes {
        let _ = writeln!(out, "<li>{}</li>", change_line(change.impact, &change.description));
    }
    for changes in comparison.property_changes.values() {
        for change in changes {
            let _ = writeln!(out, "<li>{}</li>", change_line(change.impact, &change.description));
        }
    }
    for change in &comparison.relationship_changes {
        let _ = writeln!(out, "<li>{}</li>", change_line(change.impact, &change.description));
    }
    let _ = writeln!(out, "</ul>");
}

fn change_line(impact: Impact, description: &str) -> String {
    match impact {
        Impact::Critical | Impact::Warning => {
            format!("<span class=\"breaking\">{}</span>", escape(description))
        }
        Impact::Info => escape(description),
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::{InferenceOptions, SchemaInferrer, TypeClassifier};
    use crate::types::DatabaseCatalog;
    use chrono::Utc;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[test]
    fn test_html_structure_and_escaping() {
        let inferrer = SchemaInferrer::new(TypeClassifier::new(), InferenceOptions::default());
        let mut schemas = BTreeMap::new();
        schemas.insert(
            "shop/orders".to_string(),
            inferrer.infer(&[json!({"id": "1", "Note": "<script>"})]),
        );
        let report = AnalysisReport {
            databases: vec![DatabaseCatalog::new("shop", vec!["orders".to_string()])],
            schemas,
            relationships: Vec::new(),
            timestamp: Utc::now(),
            sample_size: 10,
            failures: Vec::new(),
        };

        let html = render_html(&report, None);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<h2>Database <code>shop</code></h2>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.ends_with("</body></html>\n"));
    }
}
