//! Analysis Report
//!
//! The assembled result of one analysis run, consumed by renderers and the
//! snapshot store. Orderings exposed here are stable: containers in catalog
//! order; properties `id` first, then required, then alphabetic;
//! relationships by (fromContainer, fromProperty, toContainer).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::property::PropertyRecord;
use super::relationship::Relationship;
use super::schema::{ContainerRef, ContainerSchema, DatabaseCatalog};

/// A container that contributed no schema because sampling failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerFailure {
    pub database: String,
    pub container: String,
    pub message: String,
}

/// Result of one full analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    /// Database catalog in store enumeration order
    pub databases: Vec<DatabaseCatalog>,
    /// Container schemas keyed by `{database}/{container}`
    pub schemas: BTreeMap<String, ContainerSchema>,
    pub relationships: Vec<Relationship>,
    pub timestamp: DateTime<Utc>,
    pub sample_size: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ContainerFailure>,
}

impl AnalysisReport {
    /// Container identities in catalog enumeration order
    pub fn catalog(&self) -> Vec<ContainerRef> {
        self.databases
            .iter()
            .flat_map(|db| db.container_refs())
            .collect()
    }

    pub fn schema_for(&self, container: &ContainerRef) -> Option<&ContainerSchema> {
        self.schemas.get(&container.key())
    }

    /// Properties of one schema in presentation order: `id` first, then
    /// required, then alphabetic by path.
    pub fn ordered_properties<'a>(schema: &'a ContainerSchema) -> Vec<&'a PropertyRecord> {
        let mut props: Vec<&PropertyRecord> = schema.properties.values().collect();
        props.sort_by(|a, b| {
            let a_id = a.path == "id";
            let b_id = b.path == "id";
            b_id.cmp(&a_id)
                .then_with(|| b.is_required.cmp(&a.is_required))
                .then_with(|| a.path.cmp(&b.path))
        });
        props
    }

    /// Relationships in presentation order
    pub fn ordered_relationships(&self) -> Vec<&Relationship> {
        let mut rels: Vec<&Relationship> = self.relationships.iter().collect();
        rels.sort_by(|a, b| {
            a.from_container
                .cmp(&b.from_container)
                .then_with(|| a.from_property.cmp(&b.from_property))
                .then_with(|| a.to_container.cmp(&b.to_container))
        });
        rels
    }

    /// Total containers that produced a schema
    pub fn container_count(&self) -> usize {
        self.schemas.len()
    }
}
