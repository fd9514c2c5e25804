//! Schema Inferrer
//!
//! Accumulates a per-container property catalog by walking sampled
//! documents. Paths are dotted, with array items recorded under a
//! synthetic `path[]` record. Document-store metadata keys are skipped.
//!
//! After the walk, each record gets its frequency, requiredness,
//! optionality classification, and (when enabled) enum detection.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde_json::Value;

use crate::types::{ContainerSchema, Optionality, PropertyRecord, ValueType};

use super::classifier::TypeClassifier;

/// Store bookkeeping keys, never part of the inferred schema
const METADATA_KEYS: [&str; 5] = ["_rid", "_self", "_etag", "_ts", "_attachments"];

fn is_metadata_key(key: &str) -> bool {
    key.starts_with('_') && METADATA_KEYS.contains(&key)
}

// =============================================================================
// Options
// =============================================================================

#[derive(Debug, Clone)]
pub struct InferenceOptions {
    /// Classify each property's optionality after the walk
    pub classify_optionality: bool,
    /// Flag low-cardinality string properties as enums
    pub detect_enums: bool,
    /// Distinct-value ceiling for enum detection
    pub max_unique_values: usize,
    /// Minimum populated fraction for enum detection
    pub min_enum_frequency: f64,
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self {
            classify_optionality: true,
            detect_enums: false,
            max_unique_values: 10,
            min_enum_frequency: 0.8,
        }
    }
}

// =============================================================================
// Inferrer
// =============================================================================

/// Per-path auxiliary stats collected during the walk
#[derive(Debug, Default)]
struct PathStats {
    null_count: u64,
    /// Distinct string values, dropped once the enum ceiling is passed
    string_values: Option<BTreeSet<String>>,
    overflowed: bool,
}

#[derive(Debug, Default)]
struct Accumulator {
    records: BTreeMap<String, PropertyRecord>,
    stats: HashMap<String, PathStats>,
    /// Paths already counted for the current document
    seen_this_doc: HashSet<String>,
}

impl Accumulator {
    fn record(&mut self, path: &str) -> &mut PropertyRecord {
        self.records
            .entry(path.to_string())
            .or_insert_with(|| PropertyRecord::new(path))
    }
}

pub struct SchemaInferrer {
    classifier: TypeClassifier,
    options: InferenceOptions,
}

impl SchemaInferrer {
    pub fn new(classifier: TypeClassifier, options: InferenceOptions) -> Self {
        Self {
            classifier,
            options,
        }
    }

    /// Infer the property catalog for one container from its sampled
    /// documents. Inputs are not mutated.
    pub fn infer(&self, documents: &[Value]) -> ContainerSchema {
        let mut acc = Accumulator::default();

        for doc in documents {
            acc.seen_this_doc.clear();
            if let Value::Object(map) = doc {
                for (key, value) in map {
                    if is_metadata_key(key) {
                        continue;
                    }
                    self.visit(&mut acc, key.clone(), value);
                }
            }
        }

        self.finish(acc, documents.len() as u64)
    }

    fn visit(&self, acc: &mut Accumulator, path: String, value: &Value) {
        let tag = self.classifier.classify(value);

        {
            // Occurrences count documents, so a path revisited through a
            // second array element in the same document is not recounted.
            // Synthetic item records count elements instead and are handled
            // in visit_array_item.
            let first_visit = acc.seen_this_doc.insert(path.clone());
            let record = acc.record(&path);
            if first_visit {
                record.occurrences += 1;
            }
            record.add_type(tag.clone());
            record.add_example(format_example(value));
        }
        self.note_stats(acc, &path, value);

        match value {
            Value::Array(items) => {
                acc.record(&path).is_array = true;
                let item_path = format!("{}[]", path);
                for item in items {
                    let item_tag = self.classifier.classify(item);
                    acc.record(&path).add_item_type(item_tag.clone());
                    self.visit_array_item(acc, &item_path, item, item_tag);
                }
            }
            Value::Object(map) if !tag.is_structural() => {
                for (key, child) in map {
                    if is_metadata_key(key) {
                        continue;
                    }
                    self.visit(acc, format!("{}.{}", path, key), child);
                }
            }
            _ => {}
        }
    }

    fn visit_array_item(
        &self,
        acc: &mut Accumulator,
        item_path: &str,
        item: &Value,
        item_tag: ValueType,
    ) {
        {
            let record = acc.record(item_path);
            record.occurrences += 1;
            record.add_type(item_tag.clone());
            record.add_example(format_example(item));
        }
        self.note_stats(acc, item_path, item);

        if let Value::Object(map) = item
            && !item_tag.is_structural()
        {
            for (key, child) in map {
                if is_metadata_key(key) {
                    continue;
                }
                self.visit(acc, format!("{}.{}", item_path, key), child);
            }
        }
    }

    fn note_stats(&self, acc: &mut Accumulator, path: &str, value: &Value) {
        let stats = acc.stats.entry(path.to_string()).or_default();
        match value {
            Value::Null => stats.null_count += 1,
            Value::String(s) if self.options.detect_enums && !stats.overflowed => {
                let values = stats.string_values.get_or_insert_with(BTreeSet::new);
                values.insert(s.clone());
                if values.len() > self.options.max_unique_values {
                    stats.string_values = None;
                    stats.overflowed = true;
                }
            }
            _ => {}
        }
    }

    fn finish(&self, acc: Accumulator, document_count: u64) -> ContainerSchema {
        let Accumulator {
            mut records, stats, ..
        } = acc;

        for (path, record) in records.iter_mut() {
            record.frequency = if document_count == 0 {
                0.0
            } else {
                record.occurrences as f64 / document_count as f64
            };
            record.is_required = record.frequency >= 0.95;

            let path_stats = stats.get(path.as_str());

            if self.options.classify_optionality {
                record.optionality = Some(classify_optionality(record, path_stats));
            }

            if self.options.detect_enums
                && record.types.contains(&ValueType::String)
                && record.frequency >= self.options.min_enum_frequency
                && let Some(values) = path_stats.and_then(|s| s.string_values.as_ref())
                && !values.is_empty()
            {
                record.is_enum = true;
                record.enum_values = Some(values.iter().cloned().collect());
            }
        }

        ContainerSchema {
            properties: records,
            document_count,
        }
    }
}

fn classify_optionality(record: &PropertyRecord, stats: Option<&PathStats>) -> Optionality {
    let null_share = match stats {
        Some(s) if record.occurrences > 0 => s.null_count as f64 / record.occurrences as f64,
        _ => 0.0,
    };
    if record.frequency >= 0.95 {
        Optionality::Required
    } else if null_share >= 0.5 {
        Optionality::Nullable
    } else if record.frequency >= 0.3 {
        Optionality::Optional
    } else {
        Optionality::Sparse
    }
}

// =============================================================================
// Example Formatting
// =============================================================================

const MAX_EXAMPLE_LEN: usize = 50;

/// Render a value as a short example string: long strings truncated,
/// objects as their key set, arrays as an element count.
fn format_example(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => {
            if s.chars().count() > MAX_EXAMPLE_LEN {
                let head: String = s.chars().take(MAX_EXAMPLE_LEN).collect();
                format!("{}...", head)
            } else {
                s.clone()
            }
        }
        Value::Array(items) => format!("[{} items]", items.len()),
        Value::Object(map) => {
            let keys: Vec<&str> = map.keys().map(String::as_str).collect();
            format!("{{{}}}", keys.join(", "))
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn infer(documents: &[Value]) -> ContainerSchema {
        SchemaInferrer::new(TypeClassifier::new(), InferenceOptions::default()).infer(documents)
    }

    #[test]
    fn test_basic_catalog() {
        let docs = vec![
            json!({"id": "a", "Name": "One", "Count": 3}),
            json!({"id": "b", "Name": "Two"}),
        ];
        let schema = infer(&docs);

        assert_eq!(schema.document_count, 2);
        let id = schema.property("id").unwrap();
        assert_eq!(id.occurrences, 2);
        assert_eq!(id.frequency, 1.0);
        assert!(id.is_required);

        let count = schema.property("Count").unwrap();
        assert_eq!(count.occurrences, 1);
        assert_eq!(count.frequency, 0.5);
        assert!(!count.is_required);
        assert_eq!(count.types, vec![ValueType::Integer]);
    }

    #[test]
    fn test_metadata_keys_skipped() {
        let docs = vec![json!({
            "id": "a",
            "_rid": "x",
            "_self": "y",
            "_etag": "z",
            "_ts": 1,
            "_attachments": "w",
            "_custom": "kept"
        })];
        let schema = infer(&docs);
        assert!(schema.property("_rid").is_none());
        assert!(schema.property("_ts").is_none());
        // only the fixed bookkeeping set is skipped
        assert!(schema.property("_custom").is_some());
    }

    #[test]
    fn test_nested_paths_have_parents() {
        let docs = vec![json!({
            "Customer": {"Address": {"City": "Oslo"}},
            "Items": [{"ProductId": 1}]
        })];
        let schema = infer(&docs);

        for path in [
            "Customer",
            "Customer.Address",
            "Customer.Address.City",
            "Items",
            "Items[]",
            "Items[].ProductId",
        ] {
            assert!(schema.property(path).is_some(), "missing {}", path);
        }

        // every nested path is reachable from a root
        for record in schema.properties.values() {
            if let Some(parent) = &record.parent_path {
                assert!(
                    schema.property(parent).is_some(),
                    "parent {} of {} missing",
                    parent,
                    record.path
                );
            }
        }
    }

    #[test]
    fn test_array_items_counted_per_element() {
        let docs = vec![
            json!({"Tags": ["a", "b", "c"]}),
            json!({"Tags": ["d"]}),
        ];
        let schema = infer(&docs);

        let tags = schema.property("Tags").unwrap();
        assert_eq!(tags.occurrences, 2);
        assert!(tags.is_array);
        assert_eq!(tags.array_item_types, vec![ValueType::String]);

        let items = schema.property("Tags[]").unwrap();
        assert_eq!(items.occurrences, 4);
    }

    #[test]
    fn test_structural_objects_not_recursed() {
        let guid = "a3bb189e-8bf9-3888-9912-ace4e6543002";
        let docs = vec![json!({
            "Store": {"Id": guid, "Name": "Main", "Code": "M1"}
        })];
        let schema = infer(&docs);

        let store = schema.property("Store").unwrap();
        assert_eq!(store.types, vec![ValueType::ReferenceObject]);
        assert!(schema.property("Store.Id").is_none());
        assert!(schema.property("Store.Name").is_none());
    }

    #[test]
    fn test_mixed_types_in_observation_order() {
        let docs = vec![json!({"v": "text"}), json!({"v": 1}), json!({"v": null})];
        let schema = infer(&docs);
        let v = schema.property("v").unwrap();
        assert_eq!(
            v.types,
            vec![ValueType::String, ValueType::Integer, ValueType::Null]
        );
    }

    #[test]
    fn test_example_formatting() {
        let long = "x".repeat(80);
        let docs = vec![json!({
            "Long": long,
            "Flag": true,
            "Tags": [1, 2, 3],
            "Nested": {"a": 1, "b": 2}
        })];
        let schema = infer(&docs);

        let long_example = &schema.property("Long").unwrap().examples[0];
        assert_eq!(long_example.len(), 53);
        assert!(long_example.ends_with("..."));
        assert_eq!(schema.property("Flag").unwrap().examples[0], "true");
        assert_eq!(schema.property("Tags").unwrap().examples[0], "[3 items]");
        assert_eq!(schema.property("Nested").unwrap().examples[0], "{a, b}");
    }

    #[test]
    fn test_examples_capped_at_five_distinct() {
        let docs: Vec<Value> = (0..10).map(|i| json!({"n": i})).collect();
        let schema = infer(&docs);
        assert_eq!(schema.property("n").unwrap().examples.len(), 5);
    }

    #[test]
    fn test_optionality_classification() {
        let mut docs: Vec<Value> = (0..96).map(|_| json!({"always": 1})).collect();
        for i in 0..96 {
            if i < 50 {
                docs[i]["mostly_null"] = json!(null);
            }
            if i < 40 {
                docs[i]["sometimes"] = json!("x");
            }
            if i < 10 {
                docs[i]["rare"] = json!("y");
            }
        }
        let schema = infer(&docs);

        assert_eq!(
            schema.property("always").unwrap().optionality,
            Some(Optionality::Required)
        );
        assert_eq!(
            schema.property("mostly_null").unwrap().optionality,
            Some(Optionality::Nullable)
        );
        assert_eq!(
            schema.property("sometimes").unwrap().optionality,
            Some(Optionality::Optional)
        );
        assert_eq!(
            schema.property("rare").unwrap().optionality,
            Some(Optionality::Sparse)
        );
    }

    #[test]
    fn test_enum_detection() {
        let options = InferenceOptions {
            detect_enums: true,
            ..InferenceOptions::default()
        };
        let inferrer = SchemaInferrer::new(TypeClassifier::new(), options);

        let statuses = ["open", "closed", "pending"];
        let docs: Vec<Value> = (0..20)
            .map(|i| json!({"Status": statuses[i % 3], "Note": format!("note-{}", i)}))
            .collect();
        let schema = inferrer.infer(&docs);

        let status = schema.property("Status").unwrap();
        assert!(status.is_enum);
        assert_eq!(
            status.enum_values.as_deref().unwrap(),
            ["closed", "open", "pending"]
        );

        // too many distinct values
        let note = schema.property("Note").unwrap();
        assert!(!note.is_enum);
        assert!(note.enum_values.is_none());
    }

    #[test]
    fn test_frequency_invariant() {
        let docs = vec![
            json!({"a": 1, "b": {"c": 2}}),
            json!({"a": 1}),
            json!({"b": {"c": 3}}),
        ];
        let schema = infer(&docs);
        for record in schema.properties.values() {
            if !record.path.contains("[]") {
                assert!(record.occurrences <= schema.document_count);
            }
            let expected = record.occurrences as f64 / schema.document_count as f64;
            assert!((record.frequency - expected).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_empty_input() {
        let schema = infer(&[]);
        assert_eq!(schema.document_count, 0);
        assert!(schema.properties.is_empty());
    }
}
