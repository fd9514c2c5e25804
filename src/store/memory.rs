//! In-Memory Document Store
//!
//! Deterministic fixture store backing tests and offline runs. Failures
//! can be injected per container to exercise the pipeline's error paths.

use std::collections::BTreeMap;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use crate::types::{Result, StoreError, StoreErrorCategory};

use super::{DocumentStore, values_at_path};

#[derive(Debug, Default)]
pub struct MemoryStore {
    databases: BTreeMap<String, BTreeMap<String, Vec<Value>>>,
    /// Injected failures keyed by `{database}/{container}`
    failures: DashMap<String, StoreErrorCategory>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a container with its documents, creating the database as needed
    pub fn with_container(
        mut self,
        database: impl Into<String>,
        container: impl Into<String>,
        documents: Vec<Value>,
    ) -> Self {
        self.databases
            .entry(database.into())
            .or_default()
            .insert(container.into(), documents);
        self
    }

    /// Make every operation against the container fail with the category
    pub fn fail_container(
        self,
        database: &str,
        container: &str,
        category: StoreErrorCategory,
    ) -> Self {
        self.failures
            .insert(format!("{}/{}", database, container), category);
        self
    }

    fn check_failure(&self, database: &str, container: &str, operation: &str) -> Result<()> {
        let key = format!("{}/{}", database, container);
        if let Some(category) = self.failures.get(&key) {
            return Err(StoreError::new(*category, operation, "injected failure").into());
        }
        Ok(())
    }

    fn container(&self, database: &str, container: &str, operation: &str) -> Result<&Vec<Value>> {
        self.databases
            .get(database)
            .and_then(|db| db.get(container))
            .ok_or_else(|| {
                StoreError::new(
                    StoreErrorCategory::NotFound,
                    operation,
                    format!("{}/{} does not exist", database, container),
                )
                .into()
            })
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_databases(&self) -> Result<Vec<String>> {
        Ok(self.databases.keys().cloned().collect())
    }

    async fn list_containers(&self, database: &str) -> Result<Vec<String>> {
        self.databases
            .get(database)
            .map(|db| db.keys().cloned().collect())
            .ok_or_else(|| {
                StoreError::new(
                    StoreErrorCategory::NotFound,
                    "listContainers",
                    format!("database {} does not exist", database),
                )
                .into()
            })
    }

    async fn sample_documents(
        &self,
        database: &str,
        container: &str,
        n: usize,
    ) -> Result<Vec<Value>> {
        self.check_failure(database, container, "sampleDocuments")?;
        let docs = self.container(database, container, "sampleDocuments")?;
        Ok(docs.iter().take(n).cloned().collect())
    }

    async fn get_distinct_values(
        &self,
        database: &str,
        container: &str,
        path: &str,
        max: usize,
    ) -> Result<Vec<Value>> {
        self.check_failure(database, container, "getDistinctValues")?;
        let docs = self.container(database, container, "getDistinctValues")?;

        let mut distinct = Vec::new();
        for doc in docs {
            for value in values_at_path(doc, path) {
                if !distinct.contains(&value) {
                    distinct.push(value);
                    if distinct.len() >= max {
                        return Ok(distinct);
                    }
                }
            }
        }
        Ok(distinct)
    }

    async fn check_ids_exist(
        &self,
        database: &str,
        container: &str,
        ids: &[Value],
    ) -> Result<Vec<Value>> {
        self.check_failure(database, container, "checkIdsExist")?;
        let docs = self.container(database, container, "checkIdsExist")?;

        let existing: Vec<Value> = docs
            .iter()
            .filter_map(|doc| doc.get("id").cloned())
            .collect();
        Ok(ids
            .iter()
            .filter(|id| existing.contains(id))
            .cloned()
            .collect())
    }
}
