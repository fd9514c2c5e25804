//! Container Schemas & Catalog
//!
//! A container schema is the property catalog inferred from one container's
//! sampled documents. Containers are identified by `(database, name)`;
//! relationship matching compares names case-insensitively and uses the
//! database to disambiguate duplicates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::property::PropertyRecord;

// =============================================================================
// Container Identity
// =============================================================================

/// Identity of a container within a run: `(database, name)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerRef {
    pub database: String,
    pub name: String,
}

impl ContainerRef {
    pub fn new(database: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            name: name.into(),
        }
    }

    /// Map key used for schema lookups: `{database}/{name}`
    pub fn key(&self) -> String {
        format!("{}/{}", self.database, self.name)
    }

    /// Lower-cased container name, for case-insensitive matching
    pub fn name_lower(&self) -> String {
        self.name.to_lowercase()
    }
}

impl std::fmt::Display for ContainerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.database, self.name)
    }
}

/// One database and its containers, in store enumeration order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseCatalog {
    pub name: String,
    pub containers: Vec<String>,
}

impl DatabaseCatalog {
    pub fn new(name: impl Into<String>, containers: Vec<String>) -> Self {
        Self {
            name: name.into(),
            containers,
        }
    }

    /// Container identities for this database, in enumeration order
    pub fn container_refs(&self) -> impl Iterator<Item = ContainerRef> + '_ {
        self.containers
            .iter()
            .map(|c| ContainerRef::new(&self.name, c))
    }
}

// =============================================================================
// Container Schema
// =============================================================================

/// Property catalog for one container.
///
/// Keys are full dotted paths; the map is ordered so serialization and
/// checksums are stable. For every path containing a `.` or `[]`, the
/// prefix naming its parent is also present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSchema {
    pub properties: BTreeMap<String, PropertyRecord>,
    pub document_count: u64,
}

impl ContainerSchema {
    pub fn new(document_count: u64) -> Self {
        Self {
            properties: BTreeMap::new(),
            document_count,
        }
    }

    pub fn property(&self, path: &str) -> Option<&PropertyRecord> {
        self.properties.get(path)
    }

    /// Records with no parent path, in path order
    pub fn root_properties(&self) -> impl Iterator<Item = &PropertyRecord> {
        self.properties.values().filter(|p| p.parent_path.is_none())
    }

    /// Records nested directly under the given path
    pub fn children_of<'a>(
        &'a self,
        parent: &'a str,
    ) -> impl Iterator<Item = &'a PropertyRecord> + 'a {
        self.properties
            .values()
            .filter(move |p| p.parent_path.as_deref() == Some(parent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_ref_key() {
        let c = ContainerRef::new("shop", "orders");
        assert_eq!(c.key(), "shop/orders");
        assert_eq!(c.to_string(), "shop/orders");
    }

    #[test]
    fn test_children_of() {
        let mut schema = ContainerSchema::new(10);
        for path in ["Address", "Address.City", "Address.Zip", "Name"] {
            schema
                .properties
                .insert(path.to_string(), PropertyRecord::new(path));
        }
        let children: Vec<_> = schema.children_of("Address").map(|p| p.path.clone()).collect();
        assert_eq!(children, vec!["Address.City", "Address.Zip"]);
        assert_eq!(schema.root_properties().count(), 2);
    }
}
