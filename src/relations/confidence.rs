//! Confidence Calculator
//!
//! Scores each detected relationship by aggregating four weighted factors:
//!
//! - referential integrity (live sampling against the store, when a
//!   validator is provided)
//! - type consistency between the source property and the target `id`
//! - how often the source property is populated
//! - naming-pattern strength between property and container
//!
//! The composite is normalised by the sum of the weights actually present,
//! so a missing factor does not drag the score toward zero. Orphan edges
//! short-circuit to a fixed very-low score.
//!
//! Denormalization and observed cardinality are informational sub-records;
//! they do not enter the composite.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::store::DocumentStore;
use crate::types::{
    Cardinality, CardinalityInfo, ConfidenceAnalysis, ConfidenceFactors, ConfidenceLevel,
    ContainerSchema, DenormalizationInfo, DenormalizationStatus, FactorScore, Relationship,
};

/// Fields that mark an embedded object as a snapshot of the referenced row
const SNAPSHOT_FIELDS: [&str; 7] = [
    "name",
    "code",
    "title",
    "description",
    "status",
    "email",
    "displayname",
];

const ORPHAN_SCORE: u8 = 15;

// =============================================================================
// Options
// =============================================================================

#[derive(Debug, Clone, Copy)]
pub struct ConfidenceWeights {
    pub referential_integrity: f64,
    pub type_consistency: f64,
    pub frequency: f64,
    pub naming_pattern: f64,
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self {
            referential_integrity: 0.45,
            type_consistency: 0.20,
            frequency: 0.15,
            naming_pattern: 0.20,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfidenceOptions {
    pub weights: ConfidenceWeights,
    /// Distinct foreign-key values drawn for integrity sampling
    pub sample_size: usize,
    /// Per-store-call timeout; expiry fails the factor, not the run
    pub call_timeout: Duration,
}

impl Default for ConfidenceOptions {
    fn default() -> Self {
        Self {
            weights: ConfidenceWeights::default(),
            sample_size: 100,
            call_timeout: Duration::from_secs(30),
        }
    }
}

// =============================================================================
// Calculator
// =============================================================================

pub struct ConfidenceCalculator {
    validator: Option<Arc<dyn DocumentStore>>,
    options: ConfidenceOptions,
}

impl ConfidenceCalculator {
    /// Score from schemas alone; referential integrity gets a neutral
    /// sub-score
    pub fn new(options: ConfidenceOptions) -> Self {
        Self {
            validator: None,
            options,
        }
    }

    /// Score with live integrity sampling against the store
    pub fn with_validator(options: ConfidenceOptions, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            validator: Some(store),
            options,
        }
    }

    pub async fn analyze(
        &self,
        relationship: &Relationship,
        schemas: &BTreeMap<String, ContainerSchema>,
    ) -> ConfidenceAnalysis {
        if relationship.is_orphan {
            return ConfidenceAnalysis {
                score: ORPHAN_SCORE,
                level: ConfidenceLevel::from_score(ORPHAN_SCORE),
                factors: ConfidenceFactors::default(),
                validated: false,
                summary: "Uncertain relationship (target container not found)".to_string(),
            };
        }

        let source_schema = schemas.get(&format!(
            "{}/{}",
            relationship.from_database, relationship.from_container
        ));
        let target_schema = schemas.get(&format!(
            "{}/{}",
            relationship.to_database, relationship.to_container
        ));

        let referential_integrity = self.referential_integrity(relationship).await;
        let type_consistency = type_consistency(relationship, source_schema, target_schema);
        let frequency = frequency_factor(relationship, source_schema);
        let naming_pattern = naming_pattern(&relationship.from_property, &relationship.to_container);

        let denormalization = source_schema.map(|s| analyze_denormalization(s, &relationship.from_property));
        let cardinality = self.observe_cardinality(relationship).await;

        let validated = referential_integrity.validated;
        let factors = ConfidenceFactors {
            referential_integrity: Some(referential_integrity),
            type_consistency: Some(type_consistency),
            frequency: Some(frequency),
            naming_pattern: Some(naming_pattern),
            denormalization,
            cardinality,
        };

        let score = composite_score(&factors, &self.options.weights);
        let level = ConfidenceLevel::from_score(score);
        let summary = build_summary(relationship, &factors, level);

        ConfidenceAnalysis {
            score,
            level,
            factors,
            validated,
            summary,
        }
    }

    // =========================================================================
    // Referential Integrity
    // =========================================================================

    async fn referential_integrity(&self, relationship: &Relationship) -> FactorScore {
        let Some(store) = &self.validator else {
            return FactorScore::new(50, "not validated");
        };

        let values = match self
            .timed(store.get_distinct_values(
                &relationship.from_database,
                &relationship.from_container,
                &relationship.from_property,
                self.options.sample_size,
            ))
            .await
        {
            Ok(values) => values,
            Err(e) => return FactorScore::new(0, format!("integrity check failed: {}", e)),
        };

        if values.is_empty() {
            return FactorScore::new(0, "no values");
        }

        let non_null: Vec<Value> = values.iter().filter(|v| !v.is_null()).cloned().collect();
        if non_null.is_empty() {
            return FactorScore::new(10, "all sampled values are null")
                .validated()
                .with_match_rate(0.0);
        }

        let matched = match self
            .timed(store.check_ids_exist(
                &relationship.to_database,
                &relationship.to_container,
                &non_null,
            ))
            .await
        {
            Ok(matched) => matched,
            Err(e) => return FactorScore::new(0, format!("integrity check failed: {}", e)),
        };

        let rate = matched.len() as f64 / non_null.len() as f64;
        let score = integrity_score(rate);
        FactorScore::new(
            score,
            format!(
                "{}/{} sampled values resolve in {}",
                matched.len(),
                non_null.len(),
                relationship.to_container
            ),
        )
        .validated()
        .with_match_rate(rate)
    }

    // =========================================================================
    // Observed Cardinality
    // =========================================================================

    /// Informational only: repeat counts of foreign-key values in a raw
    /// document sample. Absent when no validator is configured or the
    /// sample cannot be drawn.
    async fn observe_cardinality(&self, relationship: &Relationship) -> Option<CardinalityInfo> {
        let store = self.validator.as_ref()?;
        let documents = match self
            .timed(store.sample_documents(
                &relationship.from_database,
                &relationship.from_container,
                self.options.sample_size,
            ))
            .await
        {
            Ok(docs) => docs,
            Err(e) => {
                debug!("Cardinality sampling skipped for {}: {}", relationship.key(), e);
                return None;
            }
        };

        let mut counts: HashMap<String, u64> = HashMap::new();
        for doc in &documents {
            for value in crate::store::values_at_path(doc, &relationship.from_property) {
                if !value.is_null() {
                    *counts.entry(value.to_string()).or_insert(0) += 1;
                }
            }
        }
        if counts.is_empty() {
            return None;
        }

        let distinct_values = counts.len() as u64;
        let max_references = counts.values().copied().max().unwrap_or(0);
        let observed = if max_references == 1 {
            Cardinality::OneToOne
        } else {
            Cardinality::ManyToOne
        };
        Some(CardinalityInfo {
            observed,
            distinct_values,
            max_references,
        })
    }

    async fn timed<T>(
        &self,
        fut: impl Future<Output = crate::types::Result<T>>,
    ) -> crate::types::Result<T> {
        match tokio::time::timeout(self.options.call_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(crate::types::MapError::timeout(
                "store call",
                self.options.call_timeout,
            )),
        }
    }
}

// =============================================================================
// Factor Scoring
// =============================================================================

/// Match-rate to confidence mapping
fn integrity_score(rate: f64) -> u8 {
    if rate >= 0.95 {
        95
    } else if rate >= 0.85 {
        85
    } else if rate >= 0.70 {
        70
    } else if rate >= 0.50 {
        50
    } else if rate >= 0.30 {
        30
    } else {
        15
    }
}

fn type_consistency(
    relationship: &Relationship,
    source_schema: Option<&ContainerSchema>,
    target_schema: Option<&ContainerSchema>,
) -> FactorScore {
    let source_types = source_schema
        .and_then(|s| s.property(&relationship.from_property))
        .map(|p| p.sorted_types());
    let target_types = target_schema
        .and_then(|s| s.property("id"))
        .map(|p| p.sorted_types());

    let (Some(source_types), Some(target_types)) = (source_types, target_types) else {
        return FactorScore::new(30, "schema not available for comparison");
    };

    let overlap: Vec<_> = source_types
        .iter()
        .filter(|t| target_types.contains(t))
        .collect();

    if overlap.is_empty() {
        FactorScore::new(
            20,
            format!(
                "no type overlap between {} and target id",
                relationship.from_property
            ),
        )
    } else if source_types.len() == 1 && target_types.len() == 1 {
        FactorScore::new(90, format!("exact type match ({})", source_types[0]))
    } else {
        FactorScore::new(65, "partial type overlap")
    }
}

fn frequency_factor(
    relationship: &Relationship,
    source_schema: Option<&ContainerSchema>,
) -> FactorScore {
    let Some(record) = source_schema.and_then(|s| s.property(&relationship.from_property)) else {
        return FactorScore::new(20, "property not found in source schema");
    };

    let frequency = record.frequency;
    let score = if frequency >= 0.95 {
        90
    } else if frequency >= 0.70 {
        70
    } else if frequency >= 0.30 {
        45
    } else {
        20
    };
    FactorScore::new(
        score,
        format!("populated in {:.0}% of documents", frequency * 100.0),
    )
}

/// Strength of the naming correlation between the referencing property
/// and the target container.
fn naming_pattern(from_property: &str, to_container: &str) -> FactorScore {
    let path = from_property.to_lowercase();
    let prop = path
        .rsplit('.')
        .next()
        .unwrap_or(&path)
        .trim_end_matches("[]");
    let container = to_container.to_lowercase();
    let singular = container.strip_suffix('s').unwrap_or(&container);

    let matches_container =
        |base: &str| base == container || format!("{}s", base) == container || base == singular;

    if let Some(base) = prop.strip_suffix("_id")
        && !base.is_empty()
    {
        if matches_container(base) {
            return FactorScore::new(90, format!("{}_id matches container {}", base, to_container));
        }
        if prefix_overlap(base, &container, singular) {
            return FactorScore::new(70, "partial name overlap");
        }
    } else if prop != "id"
        && let Some(base) = prop.strip_suffix("id")
        && !base.is_empty()
    {
        if matches_container(base) {
            return FactorScore::new(95, format!("{}Id matches container {}", base, to_container));
        }
        if prefix_overlap(base, &container, singular) {
            return FactorScore::new(70, "partial name overlap");
        }
    } else if prop == "id"
        && let Some((parent, _)) = path.rsplit_once('.')
    {
        let parent_segment = parent
            .rsplit('.')
            .next()
            .unwrap_or(parent)
            .trim_end_matches("[]");
        if matches_container(parent_segment) {
            return FactorScore::new(85, format!("nested id under {}", parent_segment));
        }
    }

    if prop == container || prop == singular {
        return FactorScore::new(60, "property named after container");
    }

    FactorScore::new(40, "weak naming correlation")
}

fn prefix_overlap(base: &str, container: &str, singular: &str) -> bool {
    base.len() >= 3
        && (container.starts_with(base) || base.starts_with(container) || base.starts_with(singular))
}

// =============================================================================
// Denormalization
// =============================================================================

/// Check whether the foreign key travels with an embedded snapshot of the
/// referenced row (nested object under the key's base name carrying
/// fields like name/code/status).
pub fn analyze_denormalization(
    schema: &ContainerSchema,
    from_property: &str,
) -> DenormalizationInfo {
    let base = from_property
        .strip_suffix("Id")
        .or_else(|| from_property.strip_suffix("_id"))
        .unwrap_or(from_property);
    let base_lower = base.to_lowercase();

    let nested_names: Vec<String> = schema
        .properties
        .values()
        .filter(|p| {
            p.parent_path
                .as_deref()
                .is_some_and(|parent| parent.to_lowercase() == base_lower)
        })
        .map(|p| p.name.to_lowercase())
        .collect();

    if nested_names.is_empty() {
        return DenormalizationInfo {
            status: DenormalizationStatus::Absent,
            confidence: 80,
            snapshot_fields: Vec::new(),
        };
    }

    let snapshot_fields: Vec<String> = nested_names
        .iter()
        .filter(|n| SNAPSHOT_FIELDS.contains(&n.as_str()))
        .cloned()
        .collect();

    if snapshot_fields.is_empty() {
        DenormalizationInfo {
            status: DenormalizationStatus::Possible,
            confidence: 50,
            snapshot_fields,
        }
    } else {
        DenormalizationInfo {
            status: DenormalizationStatus::Detected,
            confidence: 85,
            snapshot_fields,
        }
    }
}

// =============================================================================
// Composite & Summary
// =============================================================================

/// Weighted composite over the factors that are present, rounded to the
/// nearest integer.
pub fn composite_score(factors: &ConfidenceFactors, weights: &ConfidenceWeights) -> u8 {
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;

    let mut fold = |factor: &Option<FactorScore>, weight: f64| {
        if let Some(f) = factor {
            weighted_sum += f.score as f64 * weight;
            weight_total += weight;
        }
    };
    fold(&factors.referential_integrity, weights.referential_integrity);
    fold(&factors.type_consistency, weights.type_consistency);
    fold(&factors.frequency, weights.frequency);
    fold(&factors.naming_pattern, weights.naming_pattern);

    if weight_total == 0.0 {
        return 0;
    }
    (weighted_sum / weight_total).round().clamp(0.0, 100.0) as u8
}

fn build_summary(
    relationship: &Relationship,
    factors: &ConfidenceFactors,
    level: ConfidenceLevel,
) -> String {
    let mut summary = match level {
        ConfidenceLevel::High => "High confidence relationship",
        ConfidenceLevel::Medium => "Likely relationship",
        ConfidenceLevel::Low => "Possible relationship",
        ConfidenceLevel::VeryLow => "Uncertain relationship",
    }
    .to_string();

    if let Some(rate) = factors
        .referential_integrity
        .as_ref()
        .and_then(|f| f.match_rate)
    {
        if rate >= 0.9 {
            summary.push_str(", strong referential integrity");
        } else if rate < 0.5 {
            summary.push_str(", weak referential integrity");
        }
    }

    if factors
        .denormalization
        .as_ref()
        .is_some_and(DenormalizationInfo::is_denormalized)
    {
        summary.push_str(", denormalized reference");
    }

    if let Some(cardinality) = &factors.cardinality {
        match cardinality.observed {
            Cardinality::OneToOne => summary.push_str(" [1:1]"),
            Cardinality::ManyToOne => summary.push_str(" [N:1]"),
            Cardinality::OneToMany => {}
        }
    }

    if relationship.is_cross_database {
        summary.push_str(" [cross-database]");
    }
    if relationship.is_ambiguous {
        summary.push_str(" [ambiguous target]");
    }

    summary
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::{InferenceOptions, SchemaInferrer, TypeClassifier};
    use crate::store::MemoryStore;
    use serde_json::{Value, json};

    const GUID_A: &str = "11111111-1111-1111-1111-111111111111";
    const GUID_B: &str = "22222222-2222-2222-2222-222222222222";
    const GUID_C: &str = "33333333-3333-3333-3333-333333333333";

    fn rel() -> Relationship {
        Relationship {
            from_container: "orders".to_string(),
            from_database: "shop".to_string(),
            from_property: "StoreId".to_string(),
            to_container: "stores".to_string(),
            to_database: "shop".to_string(),
            to_property: "id".to_string(),
            cardinality: Cardinality::ManyToOne,
            is_cross_database: false,
            is_orphan: false,
            is_ambiguous: false,
            possible_databases: Vec::new(),
            confidence: None,
        }
    }

    fn schemas_from(docs: &[(&str, Vec<Value>)]) -> BTreeMap<String, ContainerSchema> {
        let inferrer = SchemaInferrer::new(TypeClassifier::new(), InferenceOptions::default());
        docs.iter()
            .map(|(key, documents)| (key.to_string(), inferrer.infer(documents)))
            .collect()
    }

    #[tokio::test]
    async fn test_orphan_short_circuit() {
        let mut orphan = rel();
        orphan.is_orphan = true;

        let calc = ConfidenceCalculator::new(ConfidenceOptions::default());
        let analysis = calc.analyze(&orphan, &BTreeMap::new()).await;

        assert_eq!(analysis.score, 15);
        assert_eq!(analysis.level, ConfidenceLevel::VeryLow);
        assert!(!analysis.validated);
        assert!(analysis.factors.referential_integrity.is_none());
    }

    #[tokio::test]
    async fn test_unvalidated_integrity_is_neutral() {
        let schemas = schemas_from(&[
            ("shop/orders", vec![json!({"id": GUID_A, "StoreId": GUID_B})]),
            ("shop/stores", vec![json!({"id": GUID_B})]),
        ]);

        let calc = ConfidenceCalculator::new(ConfidenceOptions::default());
        let analysis = calc.analyze(&rel(), &schemas).await;

        let ri = analysis.factors.referential_integrity.unwrap();
        assert_eq!(ri.score, 50);
        assert_eq!(ri.reason, "not validated");
        assert!(!analysis.validated);
    }

    #[tokio::test]
    async fn test_validated_perfect_integrity() {
        let store = Arc::new(
            MemoryStore::new()
                .with_container(
                    "shop",
                    "orders",
                    vec![
                        json!({"id": GUID_A, "StoreId": GUID_B}),
                        json!({"id": GUID_C, "StoreId": GUID_B}),
                    ],
                )
                .with_container("shop", "stores", vec![json!({"id": GUID_B})]),
        );
        let schemas = schemas_from(&[
            (
                "shop/orders",
                vec![
                    json!({"id": GUID_A, "StoreId": GUID_B}),
                    json!({"id": GUID_C, "StoreId": GUID_B}),
                ],
            ),
            ("shop/stores", vec![json!({"id": GUID_B})]),
        ]);

        let calc = ConfidenceCalculator::with_validator(ConfidenceOptions::default(), store);
        let analysis = calc.analyze(&rel(), &schemas).await;

        assert!(analysis.validated);
        let ri = analysis.factors.referential_integrity.unwrap();
        assert_eq!(ri.score, 95);
        assert_eq!(ri.match_rate, Some(1.0));
        assert_eq!(analysis.level, ConfidenceLevel::High);
        assert!(analysis.summary.contains("strong referential integrity"));
    }

    #[tokio::test]
    async fn test_integrity_error_fails_factor_not_run() {
        let store = Arc::new(
            MemoryStore::new()
                .with_container("shop", "orders", vec![json!({"id": GUID_A})])
                .fail_container(
                    "shop",
                    "orders",
                    crate::types::StoreErrorCategory::BadRequest,
                ),
        );
        let schemas = schemas_from(&[(
            "shop/orders",
            vec![json!({"id": GUID_A, "StoreId": GUID_B})],
        )]);

        let calc = ConfidenceCalculator::with_validator(ConfidenceOptions::default(), store);
        let analysis = calc.analyze(&rel(), &schemas).await;

        let ri = analysis.factors.referential_integrity.unwrap();
        assert_eq!(ri.score, 0);
        assert!(ri.reason.contains("integrity check failed"));
        assert!(!analysis.validated);
        // remaining factors still contribute
        assert!(analysis.score > 0);
    }

    #[tokio::test]
    async fn test_empty_sample() {
        let store = Arc::new(
            MemoryStore::new()
                .with_container("shop", "orders", vec![json!({"id": GUID_A})])
                .with_container("shop", "stores", vec![json!({"id": GUID_B})]),
        );
        let calc = ConfidenceCalculator::with_validator(ConfidenceOptions::default(), store);
        let analysis = calc.analyze(&rel(), &BTreeMap::new()).await;

        let ri = analysis.factors.referential_integrity.unwrap();
        assert_eq!(ri.score, 0);
        assert_eq!(ri.reason, "no values");
        assert!(!analysis.validated);
    }

    #[tokio::test]
    async fn test_all_null_sample() {
        let store = Arc::new(
            MemoryStore::new()
                .with_container(
                    "shop",
                    "orders",
                    vec![json!({"id": GUID_A, "StoreId": null})],
                )
                .with_container("shop", "stores", vec![json!({"id": GUID_B})]),
        );
        let calc = ConfidenceCalculator::with_validator(ConfidenceOptions::default(), store);
        let analysis = calc.analyze(&rel(), &BTreeMap::new()).await;

        let ri = analysis.factors.referential_integrity.unwrap();
        assert_eq!(ri.score, 10);
        assert_eq!(ri.match_rate, Some(0.0));
    }

    #[test]
    fn test_integrity_score_table() {
        assert_eq!(integrity_score(1.0), 95);
        assert_eq!(integrity_score(0.95), 95);
        assert_eq!(integrity_score(0.9), 85);
        assert_eq!(integrity_score(0.75), 70);
        assert_eq!(integrity_score(0.6), 50);
        assert_eq!(integrity_score(0.4), 30);
        assert_eq!(integrity_score(0.1), 15);
    }

    #[test]
    fn test_naming_pattern_scores() {
        assert_eq!(naming_pattern("StoreId", "stores").score, 95);
        assert_eq!(naming_pattern("StoreId", "store").score, 95);
        assert_eq!(naming_pattern("store_id", "stores").score, 90);
        assert_eq!(naming_pattern("Customer.Id", "customers").score, 85);
        assert_eq!(naming_pattern("Warehouse", "warehouses").score, 60);
        assert_eq!(naming_pattern("Ref", "stores").score, 40);
        assert_eq!(naming_pattern("CustomerProfileId", "customers").score, 70);
    }

    #[test]
    fn test_type_consistency_cases() {
        let schemas = schemas_from(&[
            ("shop/orders", vec![json!({"id": GUID_A, "StoreId": GUID_B})]),
            ("shop/stores", vec![json!({"id": GUID_B})]),
        ]);
        let exact = type_consistency(
            &rel(),
            schemas.get("shop/orders"),
            schemas.get("shop/stores"),
        );
        assert_eq!(exact.score, 90);

        let missing = type_consistency(&rel(), None, None);
        assert_eq!(missing.score, 30);

        let int_schemas = schemas_from(&[
            ("shop/orders", vec![json!({"id": GUID_A, "StoreId": 42})]),
            ("shop/stores", vec![json!({"id": GUID_B})]),
        ]);
        let disjoint = type_consistency(
            &rel(),
            int_schemas.get("shop/orders"),
            int_schemas.get("shop/stores"),
        );
        assert_eq!(disjoint.score, 20);
    }

    #[test]
    fn test_frequency_thresholds() {
        for (freq_docs, expected) in [(100, 90), (75, 70), (40, 45), (10, 20)] {
            let mut docs: Vec<Value> = Vec::new();
            for i in 0..100 {
                if i < freq_docs {
                    docs.push(json!({"id": "x", "StoreId": GUID_B}));
                } else {
                    docs.push(json!({"id": "x"}));
                }
            }
            let schemas = schemas_from(&[("shop/orders", docs)]);
            let factor = frequency_factor(&rel(), schemas.get("shop/orders"));
            assert_eq!(factor.score, expected, "at frequency {}", freq_docs);
        }
    }

    #[test]
    fn test_denormalization_detection() {
        let schemas = schemas_from(&[(
            "shop/orders",
            vec![json!({
                "StoreId": GUID_B,
                "Store": {"Name": "Main", "Region": "EU"}
            })],
        )]);
        let info = analyze_denormalization(schemas.get("shop/orders").unwrap(), "StoreId");
        assert_eq!(info.status, DenormalizationStatus::Detected);
        assert_eq!(info.confidence, 85);
        assert_eq!(info.snapshot_fields, vec!["name"]);

        let bare = schemas_from(&[("shop/orders", vec![json!({"StoreId": GUID_B})])]);
        let info = analyze_denormalization(bare.get("shop/orders").unwrap(), "StoreId");
        assert_eq!(info.status, DenormalizationStatus::Absent);
        assert_eq!(info.confidence, 80);

        let unrecognised = schemas_from(&[(
            "shop/orders",
            vec![json!({"StoreId": GUID_B, "Store": {"Opened": "2020-01-01"}})],
        )]);
        let info = analyze_denormalization(unrecognised.get("shop/orders").unwrap(), "StoreId");
        assert_eq!(info.status, DenormalizationStatus::Possible);
        assert_eq!(info.confidence, 50);
    }

    #[test]
    fn test_composite_normalised_by_present_weights() {
        let weights = ConfidenceWeights::default();
        let mut factors = ConfidenceFactors {
            referential_integrity: Some(FactorScore::new(80, "x")),
            type_consistency: Some(FactorScore::new(80, "x")),
            frequency: Some(FactorScore::new(80, "x")),
            naming_pattern: Some(FactorScore::new(80, "x")),
            ..Default::default()
        };
        assert_eq!(composite_score(&factors, &weights), 80);

        // dropping a factor renormalises instead of treating it as zero
        factors.referential_integrity = None;
        assert_eq!(composite_score(&factors, &weights), 80);
    }

    #[test]
    fn test_composite_weighting() {
        let weights = ConfidenceWeights::default();
        let factors = ConfidenceFactors {
            referential_integrity: Some(FactorScore::new(100, "x")),
            type_consistency: Some(FactorScore::new(0, "x")),
            frequency: Some(FactorScore::new(0, "x")),
            naming_pattern: Some(FactorScore::new(0, "x")),
            ..Default::default()
        };
        // 100 * 0.45 / 1.0 = 45
        assert_eq!(composite_score(&factors, &weights), 45);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Raising any factor sub-score with the others fixed never
            /// lowers the composite.
            #[test]
            fn composite_is_monotone(
                ri in 0u8..=100,
                tc in 0u8..=100,
                fr in 0u8..=100,
                np in 0u8..=100,
                bump in 1u8..=50,
            ) {
                let weights = ConfidenceWeights::default();
                let base = ConfidenceFactors {
                    referential_integrity: Some(FactorScore::new(ri, "x")),
                    type_consistency: Some(FactorScore::new(tc, "x")),
                    frequency: Some(FactorScore::new(fr, "x")),
                    naming_pattern: Some(FactorScore::new(np, "x")),
                    ..Default::default()
                };
                let before = composite_score(&base, &weights);

                let mut raised = base.clone();
                raised.referential_integrity =
                    Some(FactorScore::new(ri.saturating_add(bump).min(100), "x"));
                prop_assert!(composite_score(&raised, &weights) >= before);
            }
        }
    }
}
