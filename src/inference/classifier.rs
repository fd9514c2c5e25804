//! Value Type Classifier
//!
//! Pure, total function from a single JSON value to a type tag. Every input
//! returns a tag; there is no error path.
//!
//! Resolution order (first match wins, most specific first):
//!
//! 1. null
//! 2. arrays
//! 3. booleans
//! 4. numbers (integral-valued -> integer)
//! 5. strings: guid, datetime, email, url, phone, configured custom
//!    patterns in order, else string
//! 6. objects: structural shapes by key set and field tags, else object

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use crate::types::ValueType;

// =============================================================================
// String Format Patterns
// =============================================================================

/// ISO-8601 date or date-time with optional fractional seconds and
/// Z / +-HH:MM offset. Shape check only; calendar validity goes to chrono.
static DATETIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}(T\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:\d{2})?)?$")
        .expect("datetime pattern is valid")
});

/// Simplified email: local@domain.tld
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://\S+$").expect("url pattern is valid"));

/// The four accepted phone shapes: international, parenthesised area code,
/// NNN-NNN-NNNN, UK-style leading zero.
static PHONE_RES: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        Regex::new(r"^\+\d[\d\s\-()]{6,}$").expect("phone pattern is valid"),
        Regex::new(r"^\(\d{3}\)\s?\d{3}[-\s]?\d{4}$").expect("phone pattern is valid"),
        Regex::new(r"^\d{3}-\d{3}-\d{4}$").expect("phone pattern is valid"),
        Regex::new(r"^0\d{2,4}[\s-]?\d{3,4}[\s-]?\d{3,4}$").expect("phone pattern is valid"),
    ]
});

/// 8-4-4-4-12 hex, either case
fn is_guid(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() != 36 {
        return false;
    }
    for (i, b) in bytes.iter().enumerate() {
        match i {
            8 | 13 | 18 | 23 => {
                if *b != b'-' {
                    return false;
                }
            }
            _ => {
                if !b.is_ascii_hexdigit() {
                    return false;
                }
            }
        }
    }
    uuid::Uuid::try_parse(s).is_ok()
}

/// Shape plus calendar validity
fn is_datetime(s: &str) -> bool {
    if !DATETIME_RE.is_match(s) {
        return false;
    }
    if s.len() == 10 {
        return chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok();
    }
    chrono::DateTime::parse_from_rfc3339(s).is_ok()
        || chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
}

fn is_phone(s: &str) -> bool {
    PHONE_RES.iter().any(|re| re.is_match(s))
}

// =============================================================================
// Custom Patterns
// =============================================================================

/// User-configured tag with its compiled pattern
#[derive(Debug, Clone)]
pub struct CustomPattern {
    pub name: String,
    regex: Regex,
}

impl CustomPattern {
    /// Compile a configured pattern. Invalid regexes yield None and are
    /// skipped, so one bad entry cannot take down classification.
    pub fn compile(name: impl Into<String>, pattern: &str) -> Option<Self> {
        let name = name.into();
        match Regex::new(pattern) {
            Ok(regex) => Some(Self { name, regex }),
            Err(e) => {
                debug!("Skipping invalid custom pattern '{}': {}", name, e);
                None
            }
        }
    }

    pub fn matches(&self, s: &str) -> bool {
        self.regex.is_match(s)
    }
}

// =============================================================================
// Classifier
// =============================================================================

/// Value classifier with optional user-configured custom tags
#[derive(Debug, Clone, Default)]
pub struct TypeClassifier {
    custom: Vec<CustomPattern>,
}

impl TypeClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from (name, pattern) pairs; invalid patterns are dropped
    pub fn with_patterns<'a, I>(patterns: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let custom = patterns
            .into_iter()
            .filter_map(|(name, pattern)| CustomPattern::compile(name, pattern))
            .collect();
        Self { custom }
    }

    /// Classify a single value. Total and deterministic.
    pub fn classify(&self, value: &Value) -> ValueType {
        match value {
            Value::Null => ValueType::Null,
            Value::Array(_) => ValueType::Array,
            Value::Bool(_) => ValueType::Boolean,
            Value::Number(n) => classify_number(n),
            Value::String(s) => self.classify_string(s),
            Value::Object(map) => classify_object(map),
        }
    }

    fn classify_string(&self, s: &str) -> ValueType {
        if is_guid(s) {
            return ValueType::Guid;
        }
        if is_datetime(s) {
            return ValueType::DateTime;
        }
        if EMAIL_RE.is_match(s) {
            return ValueType::Email;
        }
        if URL_RE.is_match(s) {
            return ValueType::Url;
        }
        if is_phone(s) {
            return ValueType::Phone;
        }
        for pattern in &self.custom {
            if pattern.matches(s) {
                return ValueType::Custom(pattern.name.clone());
            }
        }
        ValueType::String
    }
}

fn classify_number(n: &serde_json::Number) -> ValueType {
    if n.is_i64() || n.is_u64() {
        return ValueType::Integer;
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 => ValueType::Integer,
        _ => ValueType::Number,
    }
}

// =============================================================================
// Structural Object Shapes
// =============================================================================

fn is_string_field(map: &Map<String, Value>, key: &str) -> bool {
    matches!(map.get(key), Some(Value::String(_)))
}

fn is_integer_field(map: &Map<String, Value>, key: &str) -> bool {
    matches!(map.get(key), Some(Value::Number(n)) if classify_number(n) == ValueType::Integer)
}

fn is_guid_field(map: &Map<String, Value>, key: &str) -> bool {
    matches!(map.get(key), Some(Value::String(s)) if is_guid(s))
}

fn classify_object(map: &Map<String, Value>) -> ValueType {
    // {Value: string, Epoch: integer}
    if map.len() == 2 && is_string_field(map, "Value") && is_integer_field(map, "Epoch") {
        return ValueType::DateTimeObject;
    }
    // {Id: guid, Name: string, Code: string}, extra keys permitted
    if is_guid_field(map, "Id") && is_string_field(map, "Name") && is_string_field(map, "Code") {
        return ValueType::ReferenceObject;
    }
    // {Id: integer, Name: string, Code: string}
    if map.len() == 3
        && is_integer_field(map, "Id")
        && is_string_field(map, "Name")
        && is_string_field(map, "Code")
    {
        return ValueType::LookupObject;
    }
    // {Value: string, Lower: string}, exactly these two keys
    if map.len() == 2 && is_string_field(map, "Value") && is_string_field(map, "Lower") {
        return ValueType::CaseInsensitiveString;
    }
    // {Id: guid, Reference: *}, exactly these two keys
    if map.len() == 2 && is_guid_field(map, "Id") && map.contains_key("Reference") {
        return ValueType::SimpleReference;
    }
    ValueType::Object
}

// =============================================================================
// Tests
// =============================================================================
