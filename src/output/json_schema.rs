//! JSON Schema Emission
//!
//! One draft-07 schema per container, reconstructed from the flat
//! property catalog: nested objects and arrays are rebuilt from the path
//! hierarchy, required arrays come from per-property requiredness, and
//! recognised string formats map to `format` annotations.

use serde_json::{Map, Value, json};

use crate::types::{AnalysisReport, ContainerSchema, PropertyRecord, Result, ValueType};

const DRAFT: &str = "http://json-schema.org/draft-07/schema#";

/// Render a map of container key to draft-07 schema
pub fn render_json_schemas(report: &AnalysisReport) -> Result<String> {
    let mut out = Map::new();
    for container in report.catalog() {
        let Some(schema) = report.schema_for(&container) else {
            continue;
        };
        let mut object = object_schema(schema, None);
        if let Value::Object(map) = &mut object {
            map.insert("$schema".to_string(), json!(DRAFT));
            map.insert("title".to_string(), json!(container.name));
        }
        out.insert(container.key(), object);
    }
    Ok(serde_json::to_string_pretty(&Value::Object(out))?)
}

/// Object schema from the records nested directly under `parent`
/// (document root when `parent` is None).
fn object_schema(schema: &ContainerSchema, parent: Option<&str>) -> Value {
    let children: Vec<&PropertyRecord> = schema
        .properties
        .values()
        .filter(|p| p.parent_path.as_deref() == parent && !p.name.ends_with("[]"))
        .collect();

    let mut properties = Map::new();
    let mut required = Vec::new();
    for child in children {
        properties.insert(child.name.clone(), property_schema(schema, child));
        if child.is_required {
            required.push(json!(child.name));
        }
    }

    let mut object = Map::new();
    object.insert("type".to_string(), json!("object"));
    object.insert("properties".to_string(), Value::Object(properties));
    if !required.is_empty() {
        object.insert("required".to_string(), Value::Array(required));
    }
    Value::Object(object)
}

fn property_schema(schema: &ContainerSchema, record: &PropertyRecord) -> Value {
    if record.is_array {
        let item_path = format!("{}[]", record.path);
        let items = match schema.property(&item_path) {
            Some(item_record) => property_schema(schema, item_record),
            None => json!({}),
        };
        return json!({"type": "array", "items": items});
    }

    let has_children = schema.children_of(&record.path).next().is_some();
    if has_children {
        return object_schema(schema, Some(&record.path));
    }

    type_schema(&record.types)
}

/// Schema for a leaf from its observed tags. A single tag maps to a full
/// type/format pair; mixed tags collapse to a JSON type union.
fn type_schema(types: &[ValueType]) -> Value {
    if types.len() == 1 {
        let (json_type, format) = map_type(&types[0]);
        let mut schema = Map::new();
        schema.insert("type".to_string(), json!(json_type));
        if let Some(format) = format {
            schema.insert("format".to_string(), json!(format));
        }
        if let ValueType::Custom(name) = &types[0] {
            schema.insert("description".to_string(), json!(format!("custom: {}", name)));
        }
        return Value::Object(schema);
    }

    let mut json_types: Vec<&str> = Vec::new();
    for tag in types {
        let (json_type, _) = map_type(tag);
        if !json_types.contains(&json_type) {
            json_types.push(json_type);
        }
    }
    match json_types.len() {
        0 => json!({}),
        1 => json!({"type": json_types[0]}),
        _ => json!({"type": json_types}),
    }
}

fn map_type(tag: &ValueType) -> (&'static str, Option<&'static str>) {
    match tag {
        ValueType::Null | ValueType::Undefined => ("null", None),
        ValueType::Boolean => ("boolean", None),
        ValueType::Integer => ("integer", None),
        ValueType::Number => ("number", None),
        ValueType::Array => ("array", None),
        ValueType::Object
        | ValueType::DateTimeObject
        | ValueType::ReferenceObject
        | ValueType::LookupObject
        | ValueType::CaseInsensitiveString
        | ValueType::SimpleReference => ("object", None),
        ValueType::Guid => ("string", Some("uuid")),
        ValueType::DateTime => ("string", Some("date-time")),
        ValueType::Email => ("string", Some("email")),
        ValueType::Url => ("string", Some("uri")),
        ValueType::Phone | ValueType::String | ValueType::Custom(_) => ("string", None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::{InferenceOptions, SchemaInferrer, TypeClassifier};
    use crate::types::DatabaseCatalog;
    use chrono::Utc;
    use serde_json::json;
    use std::collections::BTreeMap;

    const GUID: &str = "a3bb189e-8bf9-3888-9912-ace4e6543002";

    fn report() -> AnalysisReport {
        let inferrer = SchemaInferrer::new(TypeClassifier::new(), InferenceOptions::default());
        let mut schemas = BTreeMap::new();
        schemas.insert(
            "shop/orders".to_string(),
            inferrer.infer(&[json!({
                "id": GUID,
                "Created": "2024-03-15T10:00:00Z",
                "Customer": {"Name": "Ada"},
                "Items": [{"Sku": "A-1", "Qty": 2}]
            })]),
        );
        AnalysisReport {
            databases: vec![DatabaseCatalog::new("shop", vec!["orders".to_string()])],
            schemas,
            relationships: Vec::new(),
            timestamp: Utc::now(),
            sample_size: 10,
            failures: Vec::new(),
        }
    }

    #[test]
    fn test_draft07_shape() {
        let rendered = render_json_schemas(&report()).unwrap();
        let value: Value = serde_json::from_str(&rendered).unwrap();
        let orders = &value["shop/orders"];

        assert_eq!(orders["$schema"], DRAFT);
        assert_eq!(orders["type"], "object");
        assert_eq!(orders["properties"]["id"]["format"], "uuid");
        assert_eq!(orders["properties"]["Created"]["format"], "date-time");

        // nested object rebuilt from paths
        assert_eq!(orders["properties"]["Customer"]["type"], "object");
        assert_eq!(
            orders["properties"]["Customer"]["properties"]["Name"]["type"],
            "string"
        );

        // arrays carry item schemas
        assert_eq!(orders["properties"]["Items"]["type"], "array");
        assert_eq!(
            orders["properties"]["Items"]["items"]["properties"]["Qty"]["type"],
            "integer"
        );

        // everything was present in the single sampled document
        let required = orders["required"].as_array().unwrap();
        assert!(required.contains(&json!("id")));
        assert!(required.contains(&json!("Items")));
    }
}
