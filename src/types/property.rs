//! Property Model
//!
//! Value type tags and the per-path property records that make up an
//! inferred container schema.
//!
//! A type tag is either a primitive JSON shape (`string`, `integer`, ...), a
//! recognised string format (`guid`, `datetime`, `email`, ...), a structural
//! object shape (`ReferenceObject`, `DateTimeObject`, ...), or a
//! user-configured custom tag.

use serde::{Deserialize, Serialize};

// =============================================================================
// Value Type Tags
// =============================================================================

/// Closed set of type tags produced by the classifier.
///
/// `Undefined` never comes out of the classifier (JSON has no undefined);
/// it is retained so snapshots written by other tooling still load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueType {
    Null,
    Undefined,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
    Guid,
    DateTime,
    Email,
    Url,
    Phone,
    DateTimeObject,
    ReferenceObject,
    LookupObject,
    CaseInsensitiveString,
    SimpleReference,
    /// User-configured custom pattern tag
    Custom(String),
}

impl ValueType {
    /// Wire name of the tag
    pub fn as_str(&self) -> &str {
        match self {
            Self::Null => "null",
            Self::Undefined => "undefined",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
            Self::Guid => "guid",
            Self::DateTime => "datetime",
            Self::Email => "email",
            Self::Url => "url",
            Self::Phone => "phone",
            Self::DateTimeObject => "DateTimeObject",
            Self::ReferenceObject => "ReferenceObject",
            Self::LookupObject => "LookupObject",
            Self::CaseInsensitiveString => "CaseInsensitiveString",
            Self::SimpleReference => "SimpleReference",
            Self::Custom(name) => name,
        }
    }

    /// True for object shapes the classifier recognised by key set.
    /// The inferrer does not recurse into these.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::DateTimeObject
                | Self::ReferenceObject
                | Self::LookupObject
                | Self::CaseInsensitiveString
                | Self::SimpleReference
        )
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for ValueType {
    fn from(s: &str) -> Self {
        match s {
            "null" => Self::Null,
            "undefined" => Self::Undefined,
            "boolean" => Self::Boolean,
            "integer" => Self::Integer,
            "number" => Self::Number,
            "string" => Self::String,
            "array" => Self::Array,
            "object" => Self::Object,
            "guid" => Self::Guid,
            "datetime" => Self::DateTime,
            "email" => Self::Email,
            "url" => Self::Url,
            "phone" => Self::Phone,
            "DateTimeObject" => Self::DateTimeObject,
            "ReferenceObject" => Self::ReferenceObject,
            "LookupObject" => Self::LookupObject,
            "CaseInsensitiveString" => Self::CaseInsensitiveString,
            "SimpleReference" => Self::SimpleReference,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl Serialize for ValueType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ValueType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s.as_str()))
    }
}

// =============================================================================
// Optionality
// =============================================================================

/// How reliably a property is present across sampled documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Optionality {
    /// Present in >= 95% of documents
    Required,
    /// Observed as null in at least half its occurrences
    Nullable,
    /// Present in 30-95% of documents without nulls
    Optional,
    /// Present in fewer than 30% of documents
    Sparse,
}

impl std::fmt::Display for Optionality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Required => write!(f, "required"),
            Self::Nullable => write!(f, "nullable"),
            Self::Optional => write!(f, "optional"),
            Self::Sparse => write!(f, "sparse"),
        }
    }
}

// =============================================================================
// Property Record
// =============================================================================

/// One record per distinct path rooted at a document.
///
/// Paths are dotted, with arrays appended as `[]`:
/// `Customer.Address.City`, `Items[]`, `Items[].ProductId`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyRecord {
    /// Full dotted path from the document root
    pub path: String,
    /// Last path segment
    pub name: String,
    /// Path minus the last segment, absent for root properties
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_path: Option<String>,
    /// Tags observed at this path, in first-observation order
    pub types: Vec<ValueType>,
    /// Number of documents in which the path appears (per element for
    /// array item records, so it can exceed the document count)
    pub occurrences: u64,
    /// occurrences / sampled document count
    pub frequency: f64,
    /// Up to 5 distinct formatted example strings
    pub examples: Vec<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_array: bool,
    /// Item tags when an array was observed at this path
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub array_item_types: Vec<ValueType>,
    /// frequency >= 0.95
    pub is_required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optionality: Option<Optionality>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_enum: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_computed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed_pattern: Option<String>,
}

impl PropertyRecord {
    /// Fresh record for a path, before any observation is folded in
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let (name, parent_path) = split_path(&path);
        Self {
            path,
            name,
            parent_path,
            types: Vec::new(),
            occurrences: 0,
            frequency: 0.0,
            examples: Vec::new(),
            is_array: false,
            array_item_types: Vec::new(),
            is_required: false,
            optionality: None,
            is_enum: false,
            enum_values: None,
            is_computed: false,
            computed_pattern: None,
        }
    }

    /// Add a tag unless already observed, preserving first-observation order
    pub fn add_type(&mut self, tag: ValueType) {
        if !self.types.contains(&tag) {
            self.types.push(tag);
        }
    }

    /// Add an array item tag unless already observed
    pub fn add_item_type(&mut self, tag: ValueType) {
        if !self.array_item_types.contains(&tag) {
            self.array_item_types.push(tag);
        }
    }

    /// Add a distinct formatted example, capped at 5
    pub fn add_example(&mut self, example: String) {
        if self.examples.len() < 5 && !self.examples.contains(&example) {
            self.examples.push(example);
        }
    }

    /// Types sorted by wire name, for order-insensitive comparison
    pub fn sorted_types(&self) -> Vec<ValueType> {
        let mut sorted = self.types.clone();
        sorted.sort();
        sorted
    }

    /// True when this path is nested under another property
    pub fn is_nested(&self) -> bool {
        self.parent_path.is_some()
    }
}

/// Split a dotted path into (last segment, parent path).
///
/// A synthetic array item path is parented by the array property itself:
/// `Items[]` -> ("Items[]", Some("Items")),
/// `Order.Items[]` -> ("Items[]", Some("Order.Items")),
/// `Items[].ProductId` -> ("ProductId", Some("Items[]")).
pub fn split_path(path: &str) -> (String, Option<String>) {
    if let Some(base) = path.strip_suffix("[]") {
        if base.is_empty() {
            return (path.to_string(), None);
        }
        let name = match base.rsplit_once('.') {
            Some((_, last)) => format!("{}[]", last),
            None => path.to_string(),
        };
        return (name, Some(base.to_string()));
    }
    match path.rsplit_once('.') {
        Some((parent, name)) => (name.to_string(), Some(parent.to_string())),
        None => (path.to_string(), None),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_round_trip() {
        for tag in [
            ValueType::Null,
            ValueType::Guid,
            ValueType::DateTime,
            ValueType::ReferenceObject,
            ValueType::CaseInsensitiveString,
            ValueType::Custom("sku".to_string()),
        ] {
            let json = serde_json::to_string(&tag).unwrap();
            let back: ValueType = serde_json::from_str(&json).unwrap();
            assert_eq!(tag, back);
        }
    }

    #[test]
    fn test_tag_wire_names() {
        assert_eq!(ValueType::Guid.as_str(), "guid");
        assert_eq!(ValueType::DateTime.as_str(), "datetime");
        assert_eq!(ValueType::ReferenceObject.as_str(), "ReferenceObject");
        assert_eq!(ValueType::Custom("sku".into()).as_str(), "sku");
    }

    #[test]
    fn test_structural_tags() {
        assert!(ValueType::ReferenceObject.is_structural());
        assert!(ValueType::SimpleReference.is_structural());
        assert!(!ValueType::Object.is_structural());
        assert!(!ValueType::Guid.is_structural());
    }

    #[test]
    fn test_split_path() {
        assert_eq!(split_path("City"), ("City".to_string(), None));
        assert_eq!(
            split_path("Address.City"),
            ("City".to_string(), Some("Address".to_string()))
        );
        assert_eq!(
            split_path("Items[]"),
            ("Items[]".to_string(), Some("Items".to_string()))
        );
        assert_eq!(
            split_path("Order.Items[]"),
            ("Items[]".to_string(), Some("Order.Items".to_string()))
        );
        assert_eq!(
            split_path("Items[].ProductId"),
            ("ProductId".to_string(), Some("Items[]".to_string()))
        );
    }

    #[test]
    fn test_add_type_preserves_order() {
        let mut record = PropertyRecord::new("Status");
        record.add_type(ValueType::String);
        record.add_type(ValueType::Null);
        record.add_type(ValueType::String);
        assert_eq!(record.types, vec![ValueType::String, ValueType::Null]);
    }

    #[test]
    fn test_examples_capped_and_distinct() {
        let mut record = PropertyRecord::new("Status");
        for i in 0..8 {
            record.add_example(format!("value-{}", i % 6));
        }
        assert_eq!(record.examples.len(), 5);
        assert_eq!(record.examples[0], "value-0");
    }

    #[test]
    fn test_optional_fields_absent_in_json() {
        let record = PropertyRecord::new("Status");
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("optionality").is_none());
        assert!(json.get("enumValues").is_none());
        assert!(json.get("isArray").is_none());
    }
}
