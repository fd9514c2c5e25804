//! Snapshots
//!
//! An immutable, serialised analysis result: version, metadata (including
//! a SHA-256 checksum over the canonical JSON of schemas and
//! relationships), the database catalog, container schemas, and
//! relationships. Created after a successful analysis and never mutated;
//! deletion happens only through pruning, which never touches a named
//! snapshot.

mod store;

pub use store::SnapshotStore;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::types::{
    AnalysisReport, ContainerSchema, DatabaseCatalog, Relationship, Result,
};

pub const SNAPSHOT_VERSION: &str = "1.0";

// =============================================================================
// Model
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMetadata {
    /// Derived from `created_at` by replacing `:` and `.` with `-`
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub sample_size: usize,
    pub databases: Vec<String>,
    pub container_count: usize,
    pub relationship_count: usize,
    /// Hex SHA-256 of the canonical JSON of `{schemas, relationships}`
    pub checksum: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub version: String,
    pub metadata: SnapshotMetadata,
    pub databases: Vec<DatabaseCatalog>,
    pub schemas: BTreeMap<String, ContainerSchema>,
    pub relationships: Vec<Relationship>,
}

impl Snapshot {
    /// Freeze an analysis result into a snapshot
    pub fn from_report(report: &AnalysisReport, name: Option<String>) -> Result<Self> {
        let checksum = checksum(&report.schemas, &report.relationships)?;
        let metadata = SnapshotMetadata {
            id: id_for_timestamp(&report.timestamp),
            name,
            created_at: report.timestamp,
            sample_size: report.sample_size,
            databases: report.databases.iter().map(|d| d.name.clone()).collect(),
            container_count: report.schemas.len(),
            relationship_count: report.relationships.len(),
            checksum,
        };
        Ok(Self {
            version: SNAPSHOT_VERSION.to_string(),
            metadata,
            databases: report.databases.clone(),
            schemas: report.schemas.clone(),
            relationships: report.relationships.clone(),
        })
    }

    /// Reconstruct an analysis result for comparison and rendering
    pub fn to_report(&self) -> AnalysisReport {
        AnalysisReport {
            databases: self.databases.clone(),
            schemas: self.schemas.clone(),
            relationships: self.relationships.clone(),
            timestamp: self.metadata.created_at,
            sample_size: self.metadata.sample_size,
            failures: Vec::new(),
        }
    }

    /// Recompute the checksum and compare against the stored one
    pub fn verify_checksum(&self) -> Result<bool> {
        let actual = checksum(&self.schemas, &self.relationships)?;
        Ok(actual == self.metadata.checksum)
    }
}

// =============================================================================
// Checksum & Id
// =============================================================================

/// Hex SHA-256 over the canonical (key-sorted) JSON of schemas and
/// relationships. Routing through `serde_json::Value` sorts object keys,
/// making the digest independent of struct field order.
pub fn checksum(
    schemas: &BTreeMap<String, ContainerSchema>,
    relationships: &[Relationship],
) -> Result<String> {
    let canonical = serde_json::to_value(serde_json::json!({
        "schemas": schemas,
        "relationships": relationships,
    }))?;
    let bytes = serde_json::to_vec(&canonical)?;
    let digest = Sha256::digest(&bytes);
    Ok(format!("{:x}", digest))
}

/// Filesystem-safe snapshot id from a creation timestamp
pub fn id_for_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp
        .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}

// =============================================================================
// Tests
// =============================================================================
