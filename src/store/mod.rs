//! Document Store Collaborators
//!
//! The engine depends on this interface for everything that touches the
//! wire: enumerating databases and containers, sampling documents, and the
//! value lookups behind live referential-integrity checks.
//!
//! Implementations:
//!
//! - [`CosmosClient`]: REST client with master-key auth
//! - [`MemoryStore`]: deterministic in-memory fixture for tests and
//!   offline runs

mod cosmos;
mod memory;

pub use cosmos::{CosmosClient, CosmosClientConfig};
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde_json::Value;

use crate::types::Result;

/// Read-only view over a hierarchical document store
/// (databases -> containers -> documents).
///
/// Errors surface as typed [`crate::types::StoreError`] failures; the
/// engine catches them at the boundary and records them per container or
/// per relationship.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Enumerate database names
    async fn list_databases(&self) -> Result<Vec<String>>;

    /// Enumerate container names within a database
    async fn list_containers(&self, database: &str) -> Result<Vec<String>>;

    /// Return up to `n` documents; the sampling strategy is the store's
    /// concern
    async fn sample_documents(&self, database: &str, container: &str, n: usize)
    -> Result<Vec<Value>>;

    /// Distinct values of a dotted path, up to `max`
    async fn get_distinct_values(
        &self,
        database: &str,
        container: &str,
        path: &str,
        max: usize,
    ) -> Result<Vec<Value>>;

    /// Subset of `ids` that exist as `id` in the container
    async fn check_ids_exist(
        &self,
        database: &str,
        container: &str,
        ids: &[Value],
    ) -> Result<Vec<Value>>;
}

/// Extract every value at a dotted path inside a document. Array markers
/// (`Items[]`) fan out over elements, so one document can yield several
/// values.
pub(crate) fn values_at_path(document: &Value, path: &str) -> Vec<Value> {
    fn walk<'a>(value: &'a Value, segments: &[&str], out: &mut Vec<&'a Value>) {
        let Some((segment, rest)) = segments.split_first() else {
            out.push(value);
            return;
        };
        let (key, is_array) = match segment.strip_suffix("[]") {
            Some(k) => (k, true),
            None => (*segment, false),
        };
        let Some(child) = value.get(key) else {
            return;
        };
        if is_array {
            if let Value::Array(items) = child {
                for item in items {
                    walk(item, rest, out);
                }
            }
        } else {
            walk(child, rest, out);
        }
    }

    let segments: Vec<&str> = path.split('.').collect();
    let mut found = Vec::new();
    walk(document, &segments, &mut found);
    found.into_iter().cloned().collect()
}
