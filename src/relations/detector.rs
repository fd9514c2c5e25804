//! Relationship Detector
//!
//! Derives candidate directed references from one container's schema and
//! the full container catalog. Candidates come from naming patterns on
//! property names and from structural reference tags; each candidate's
//! target name is resolved against the catalog with name-variant matching.
//!
//! ## Pattern rules
//!
//! - camel-case foreign key: `{Base}Id` -> target `base`
//! - snake-case foreign key: `{base}_id` -> target `base`
//! - nested key: an `Id` property targets its parent segment's name
//! - structural tag: `ReferenceObject` / `SimpleReference` properties
//!   target their own name
//! - container-name match: a property named after a known container
//!   (suppressed when another rule already fired for the property)
//!
//! Resolution prefers the source database; otherwise all databases are
//! searched, marking cross-database, ambiguous, or orphan edges.

use std::collections::HashSet;

use tracing::debug;

use crate::types::{Cardinality, ContainerRef, ContainerSchema, Relationship, ValueType};

// =============================================================================
// Name Variants
// =============================================================================

/// Variants tried when matching a derived target name against container
/// names: the name itself, naive plural, naive singular, and `ies -> y`.
fn name_variants(target: &str) -> Vec<String> {
    let mut variants = vec![target.to_string(), format!("{}s", target)];
    if let Some(singular) = target.strip_suffix('s')
        && !singular.is_empty()
    {
        variants.push(singular.to_string());
    }
    if let Some(stem) = target.strip_suffix("ies")
        && !stem.is_empty()
    {
        variants.push(format!("{}y", stem));
    }
    variants
}

// =============================================================================
// Target Resolution
// =============================================================================

#[derive(Debug)]
enum Resolution {
    /// Target resolved to the source container itself; candidate dropped
    SelfReference,
    Found {
        target: ContainerRef,
        cross_database: bool,
        ambiguous: bool,
        possible_databases: Vec<String>,
    },
    Orphan,
}

// =============================================================================
// Detector
// =============================================================================

pub struct RelationshipDetector {
    catalog: Vec<ContainerRef>,
}

impl RelationshipDetector {
    /// Catalog order is significant: it breaks ambiguous-target ties and
    /// fixes the order of `possible_databases`.
    pub fn new(catalog: Vec<ContainerRef>) -> Self {
        Self { catalog }
    }

    /// Detect candidate relationships for one container. The output is
    /// deduplicated on (target, source property) and ordered by the
    /// schema's property iteration order.
    pub fn detect(&self, source: &ContainerRef, schema: &ContainerSchema) -> Vec<Relationship> {
        let mut relationships = Vec::new();
        let mut emitted: HashSet<(String, String)> = HashSet::new();

        for record in schema.properties.values() {
            // a plain `id` is the container's own key, never a reference
            if record.name == "id" {
                continue;
            }

            for (target_name, from_property) in self.candidates_for(source, record) {
                let resolution = self.resolve(source, &target_name);

                let relationship = match resolution {
                    Resolution::SelfReference => continue,
                    Resolution::Found {
                        target,
                        cross_database,
                        ambiguous,
                        possible_databases,
                    } => Relationship {
                        from_container: source.name.clone(),
                        from_database: source.database.clone(),
                        from_property: from_property.clone(),
                        to_container: target.name,
                        to_database: target.database,
                        to_property: "id".to_string(),
                        cardinality: Cardinality::ManyToOne,
                        is_cross_database: cross_database,
                        is_orphan: false,
                        is_ambiguous: ambiguous,
                        possible_databases,
                        confidence: None,
                    },
                    Resolution::Orphan => Relationship {
                        from_container: source.name.clone(),
                        from_database: source.database.clone(),
                        from_property: from_property.clone(),
                        to_container: target_name.clone(),
                        to_database: source.database.clone(),
                        to_property: "id".to_string(),
                        cardinality: Cardinality::ManyToOne,
                        is_cross_database: false,
                        is_orphan: true,
                        is_ambiguous: false,
                        possible_databases: Vec::new(),
                        confidence: None,
                    },
                };

                let key = (relationship.to_container.clone(), from_property);
                if emitted.insert(key) {
                    relationships.push(relationship);
                }
            }
        }

        debug!(
            "Detected {} candidate relationships for {}",
            relationships.len(),
            source
        );
        relationships
    }

    /// Apply pattern rules to one property record, yielding
    /// (derived target name, from_property) pairs in rule order.
    fn candidates_for(
        &self,
        source: &ContainerRef,
        record: &crate::types::PropertyRecord,
    ) -> Vec<(String, String)> {
        let mut candidates = Vec::new();
        let name = record.name.as_str();
        let source_lower = source.name_lower();

        // camel-case foreign key: {Base}Id
        if let Some(base) = name.strip_suffix("Id")
            && name != "Id"
            && !base.is_empty()
        {
            candidates.push((base.to_lowercase(), record.path.clone()));
        }

        // snake-case foreign key: {base}_id
        if let Some(base) = name.strip_suffix("_id")
            && !base.is_empty()
        {
            candidates.push((base.to_lowercase(), record.path.clone()));
        }

        // nested Id under a named parent
        if name == "Id"
            && let Some(parent_path) = &record.parent_path
        {
            let parent_segment = parent_path
                .rsplit('.')
                .next()
                .unwrap_or(parent_path)
                .trim_end_matches("[]");
            let target = parent_segment.to_lowercase();
            if !target.is_empty() && target != source_lower {
                candidates.push((target, parent_path.clone()));
            }
        }

        // structural reference tags
        if record
            .types
            .iter()
            .any(|t| matches!(t, ValueType::ReferenceObject | ValueType::SimpleReference))
        {
            let target = name.to_lowercase();
            if target != source_lower {
                candidates.push((target, record.path.clone()));
            }
        }

        // property named after a known container; suppressed when any
        // other pattern fired for this same property
        if candidates.is_empty() {
            let target = name.to_lowercase();
            let variants = name_variants(&target);
            let exists = self
                .catalog
                .iter()
                .any(|c| c != source && variants.contains(&c.name_lower()));
            if exists {
                candidates.push((target, record.path.clone()));
            }
        }

        candidates
    }

    fn resolve(&self, source: &ContainerRef, target_name: &str) -> Resolution {
        let variants = name_variants(target_name);
        let matches_name = |c: &ContainerRef| variants.contains(&c.name_lower());

        // Pass 1: same database wins outright
        let mut matched_self = false;
        for container in self
            .catalog
            .iter()
            .filter(|c| c.database == source.database && matches_name(c))
        {
            if container == source {
                matched_self = true;
                continue;
            }
            return Resolution::Found {
                target: container.clone(),
                cross_database: false,
                ambiguous: false,
                possible_databases: Vec::new(),
            };
        }
        if matched_self {
            return Resolution::SelfReference;
        }

        // Pass 2: every other database, in catalog order
        let matches: Vec<&ContainerRef> = self
            .catalog
            .iter()
            .filter(|c| *c != source && matches_name(c))
            .collect();

        let Some(first) = matches.first() else {
            return Resolution::Orphan;
        };

        let mut databases: Vec<String> = Vec::new();
        for m in &matches {
            if !databases.contains(&m.database) {
                databases.push(m.database.clone());
            }
        }

        let ambiguous = databases.len() > 1;
        Resolution::Found {
            target: (*first).clone(),
            cross_database: true,
            ambiguous,
            possible_databases: if ambiguous { databases } else { Vec::new() },
        }
    }
}

// =============================================================================
// Derived Views
// =============================================================================

/// One-to-many inversions of every non-orphan forward edge.
pub fn inversions(relationships: &[Relationship]) -> Vec<Relationship> {
    relationships
        .iter()
        .filter(|r| !r.is_orphan)
        .map(Relationship::inverted)
        .collect()
}

/// Deduplicate edges for diagram rendering: one edge per unordered
/// container pair and source property, orphans dropped.
pub fn unique_for_erd(relationships: &[Relationship]) -> Vec<Relationship> {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for r in relationships {
        if r.is_orphan {
            continue;
        }
        let (a, b) = if r.from_container <= r.to_container {
            (&r.from_container, &r.to_container)
        } else {
            (&r.to_container, &r.from_container)
        };
        let key = format!("{}|{}|{}", a, b, r.from_property);
        if seen.insert(key) {
            unique.push(r.clone());
        }
    }
    unique
}

// =============================================================================
// Tests
// =============================================================================
