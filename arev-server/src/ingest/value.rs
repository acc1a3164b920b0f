//! Tagged value type for uploaded JSONL records
//!
//! Every JSON number read by the parser is kept as its literal decimal text
//! (`RecordValue::Number`) so identifiers never lose digits to `f64`. The
//! `Integer` and `Float` variants exist for values built in code.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;

/// One decoded JSONL line: field name to value
pub type Record = BTreeMap<String, RecordValue>;

/// A JSON value with explicit numeric kinds
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    Null,
    Bool(bool),
    /// Integral number of any width that fits `i128`
    Integer(i128),
    Float(f64),
    /// Number kept as the literal text it was decoded from
    Number(String),
    String(String),
    Array(Vec<RecordValue>),
    Object(Record),
}

impl RecordValue {
    /// Human-readable text for any variant
    ///
    /// Strings come back as-is, numbers in their literal form, and
    /// compound values as compact JSON. Aspect labels are derived this way.
    pub fn to_display_string(&self) -> String {
        match self {
            RecordValue::String(s) => s.clone(),
            RecordValue::Null => "null".to_string(),
            RecordValue::Bool(b) => b.to_string(),
            RecordValue::Integer(i) => i.to_string(),
            RecordValue::Float(f) => f.to_string(),
            RecordValue::Number(text) => text.clone(),
            RecordValue::Array(_) | RecordValue::Object(_) => {
                serde_json::to_string(self).unwrap_or_default()
            }
        }
    }
}

impl From<Value> for RecordValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => RecordValue::Null,
            Value::Bool(b) => RecordValue::Bool(b),
            // With arbitrary_precision the Display form is the source literal
            Value::Number(n) => RecordValue::Number(n.to_string()),
            Value::String(s) => RecordValue::String(s),
            Value::Array(items) => {
                RecordValue::Array(items.into_iter().map(RecordValue::from).collect())
            }
            Value::Object(map) => RecordValue::Object(
                map.into_iter()
                    .map(|(k, v)| (k, RecordValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for RecordValue {
    fn from(s: &str) -> Self {
        RecordValue::String(s.to_string())
    }
}

impl From<String> for RecordValue {
    fn from(s: String) -> Self {
        RecordValue::String(s)
    }
}

impl From<i64> for RecordValue {
    fn from(i: i64) -> Self {
        RecordValue::Integer(i128::from(i))
    }
}

impl From<f64> for RecordValue {
    fn from(f: f64) -> Self {
        RecordValue::Float(f)
    }
}

impl Serialize for RecordValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RecordValue::Null => serializer.serialize_unit(),
            RecordValue::Bool(b) => serializer.serialize_bool(*b),
            RecordValue::Integer(i) => serializer.serialize_i128(*i),
            RecordValue::Float(f) => serializer.serialize_f64(*f),
            // Re-emit the literal as a JSON number, not a string
            RecordValue::Number(text) => match serde_json::Number::from_str(text) {
                Ok(n) => n.serialize(serializer),
                Err(_) => serializer.serialize_str(text),
            },
            RecordValue::String(s) => serializer.serialize_str(s),
            RecordValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            RecordValue::Object(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbers_keep_literal_text() {
        let value: Value = serde_json::from_str(r#"{"pmid": 12345678901234567890123}"#).unwrap();
        let record = RecordValue::from(value);

        let RecordValue::Object(map) = record else {
            panic!("expected an object");
        };
        assert_eq!(map["pmid"], RecordValue::Number("12345678901234567890123".to_string()));
    }

    #[test]
    fn test_number_serializes_as_json_number() {
        let value = RecordValue::Number("1.50".to_string());
        assert_eq!(serde_json::to_string(&value).unwrap(), "1.50");
    }

    #[test]
    fn test_display_string_for_compound_values() {
        let value: Value = serde_json::from_str(r#"["a", 1]"#).unwrap();
        assert_eq!(RecordValue::from(value).to_display_string(), r#"["a",1]"#);
        assert_eq!(RecordValue::Null.to_display_string(), "null");
        assert_eq!(RecordValue::Bool(true).to_display_string(), "true");
    }
}
