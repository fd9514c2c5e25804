//! Report Renderers
//!
//! Mechanical emission of the analysis result. Every renderer consumes the
//! stable orderings exposed by [`AnalysisReport`]; none of them add
//! semantics.

mod html;
mod json_schema;
mod markdown;
mod mermaid;

pub use html::render_html;
pub use json_schema::render_json_schemas;
pub use markdown::render_markdown;
pub use mermaid::render_mermaid;

use std::str::FromStr;

use crate::types::{AnalysisReport, ComparisonReport, MapError, Result};

/// Selectable output format for the rendered report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Markdown,
    Html,
    Mermaid,
    JsonSchema,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Html => "html",
            Self::Mermaid => "mmd",
            Self::JsonSchema | Self::Json => "json",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Html => "html",
            Self::Mermaid => "mermaid",
            Self::JsonSchema => "json-schema",
            Self::Json => "json",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "html" => Ok(Self::Html),
            "mermaid" | "erd" => Ok(Self::Mermaid),
            "json-schema" | "jsonschema" => Ok(Self::JsonSchema),
            "json" => Ok(Self::Json),
            other => Err(MapError::UnknownFormat(other.to_string())),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Render the report in the requested format
pub fn render(
    format: OutputFormat,
    report: &AnalysisReport,
    comparison: Option<&ComparisonReport>,
) -> Result<String> {
    match format {
        OutputFormat::Markdown => Ok(render_markdown(report, comparison)),
        OutputFormat::Html => Ok(render_html(report, comparison)),
        OutputFormat::Mermaid => Ok(render_mermaid(report)),
        OutputFormat::JsonSchema => render_json_schemas(report),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parsing() {
        assert_eq!("markdown".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("HTML".parse::<OutputFormat>().unwrap(), OutputFormat::Html);
        assert_eq!(
            "json-schema".parse::<OutputFormat>().unwrap(),
            OutputFormat::JsonSchema
        );
        assert!(matches!(
            "csv".parse::<OutputFormat>(),
            Err(MapError::UnknownFormat(_))
        ));
    }

    #[test]
    fn test_extensions() {
        assert_eq!(OutputFormat::Markdown.extension(), "md");
        assert_eq!(OutputFormat::Mermaid.extension(), "mmd");
        assert_eq!(OutputFormat::Json.extension(), "json");
    }
}
