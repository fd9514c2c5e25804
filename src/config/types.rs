//! Configuration Types
//!
//! Serde-backed settings merged from defaults, config file, environment,
//! and CLI overrides. Validation runs once after merging; a bad value
//! fails fast before any store call.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::output::OutputFormat;
use crate::types::{MapError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub version: String,
    pub cosmos: CosmosSettings,
    pub analysis: AnalysisSettings,
    pub output: OutputSettings,
    pub snapshot: SnapshotSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            cosmos: CosmosSettings::default(),
            analysis: AnalysisSettings::default(),
            output: OutputSettings::default(),
            snapshot: SnapshotSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CosmosSettings {
    /// Account endpoint URL; required before any store call
    pub endpoint: Option<String>,
    /// Account master key (base64); prefer the COSMOS_KEY env var over
    /// writing this into a config file
    pub key: Option<String>,
    pub timeout_secs: u64,
    /// Skip TLS verification (local emulators only)
    pub accept_invalid_certs: bool,
}

impl Default for CosmosSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            key: None,
            timeout_secs: 30,
            accept_invalid_certs: false,
        }
    }
}

impl CosmosSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub sample_size: usize,
    /// Databases to analyse; empty means all
    pub databases: Vec<String>,
    /// Restrict to a single container
    pub container: Option<String>,
    /// Live referential-integrity validation
    pub validate_relationships: bool,
    /// Simultaneous store calls; defaults to the hardware thread count
    pub concurrency: Option<usize>,
    pub detect_enums: bool,
    pub max_unique_values: usize,
    pub min_enum_frequency: f64,
    /// Extra classifier tags as (name, regex) entries
    pub custom_patterns: Vec<CustomPatternEntry>,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            sample_size: 100,
            databases: Vec::new(),
            container: None,
            validate_relationships: true,
            concurrency: None,
            detect_enums: false,
            max_unique_values: 10,
            min_enum_frequency: 0.8,
            custom_patterns: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomPatternEntry {
    pub name: String,
    pub pattern: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub dir: PathBuf,
    /// One of: markdown, html, mermaid, json-schema, json
    pub format: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            format: "markdown".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotSettings {
    pub cache_dir: PathBuf,
}

impl Default for SnapshotSettings {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(".cosmoscache"),
        }
    }
}

impl Config {
    /// Fail fast on values no run can work with
    pub fn validate(&self) -> Result<()> {
        if self.analysis.sample_size == 0 {
            return Err(MapError::Config(
                "analysis.sample_size must be at least 1".to_string(),
            ));
        }
        self.output.format.parse::<OutputFormat>()?;
        if !(0.0..=1.0).contains(&self.analysis.min_enum_frequency) {
            return Err(MapError::Config(
                "analysis.min_enum_frequency must be within 0.0..=1.0".to_string(),
            ));
        }
        if let Some(0) = self.analysis.concurrency {
            return Err(MapError::Config(
                "analysis.concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn format(&self) -> Result<OutputFormat> {
        self.output.format.parse()
    }

    /// Endpoint is only mandatory once we actually talk to the store
    pub fn require_endpoint(&self) -> Result<&str> {
        self.cosmos
            .endpoint
            .as_deref()
            .filter(|e| !e.is_empty())
            .ok_or_else(|| {
                MapError::Config(
                    "no endpoint configured; set cosmos.endpoint or COSMOS_ENDPOINT".to_string(),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.analysis.sample_size, 100);
        assert_eq!(config.snapshot.cache_dir, PathBuf::from(".cosmoscache"));
        assert_eq!(config.format().unwrap(), OutputFormat::Markdown);
    }

    #[test]
    fn test_zero_sample_size_rejected() {
        let mut config = Config::default();
        config.analysis.sample_size = 0;
        assert!(matches!(config.validate(), Err(MapError::Config(_))));
    }

    #[test]
    fn test_unknown_format_rejected() {
        let mut config = Config::default();
        config.output.format = "docx".to_string();
        assert!(matches!(
            config.validate(),
            Err(MapError::UnknownFormat(_))
        ));
    }

    #[test]
    fn test_missing_endpoint_reported() {
        let config = Config::default();
        assert!(config.require_endpoint().is_err());

        let mut with_endpoint = Config::default();
        with_endpoint.cosmos.endpoint = Some("https://acct.documents.azure.com".to_string());
        assert!(with_endpoint.require_endpoint().is_ok());
    }
}
