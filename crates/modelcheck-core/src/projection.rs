//! Plain JSON projection of validated records.

use serde_json::{Map, Number, Value};

use crate::value::{FieldValue, Record};

/// Unwrap a record into a plain JSON object, recursively.
///
/// Nested records become objects and sequences become arrays. A non-finite
/// float (only a hook can produce one) projects to `null`.
pub fn to_plain_mapping(record: &Record) -> Map<String, Value> {
    record
        .fields()
        .map(|(name, value)| (name.to_string(), to_plain_value(value)))
        .collect()
}

pub fn to_plain_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => Value::Null,
        FieldValue::Bool(b) => Value::Bool(*b),
        FieldValue::Int(n) => Value::Number((*n).into()),
        FieldValue::Float(x) => Number::from_f64(*x).map_or(Value::Null, Value::Number),
        FieldValue::Str(s) => Value::String(s.clone()),
        FieldValue::List(items) => Value::Array(items.iter().map(to_plain_value).collect()),
        FieldValue::Record(record) => Value::Object(to_plain_mapping(record)),
    }
}

impl Record {
    /// The record as a JSON object value.
    pub fn to_json(&self) -> Value {
        Value::Object(to_plain_mapping(self))
    }
}
