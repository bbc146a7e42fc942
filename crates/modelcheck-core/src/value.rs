//! Validated values and records.

use std::fmt;

use serde_json::Value;

/// A typed value accepted by validation, or supplied as a field default.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<FieldValue>),
    Record(Record),
}

impl FieldValue {
    /// Name of the value's kind, as used in failure messages.
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Bool(_) => "boolean",
            FieldValue::Int(_) => "integer",
            FieldValue::Float(_) => "float",
            FieldValue::Str(_) => "string",
            FieldValue::List(_) => "list",
            FieldValue::Record(_) => "record",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric view; integers widen to floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(n) => Some(*n as f64),
            FieldValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            FieldValue::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Convert a JSON literal into a value, for defaults read from
    /// definition files. Objects have no literal form and yield `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(FieldValue::Null),
            Value::Bool(b) => Some(FieldValue::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(FieldValue::Int(i)),
                None => n.as_f64().map(FieldValue::Float),
            },
            Value::String(s) => Some(FieldValue::Str(s.clone())),
            Value::Array(items) => items
                .iter()
                .map(FieldValue::from_json)
                .collect::<Option<Vec<_>>>()
                .map(FieldValue::List),
            Value::Object(_) => None,
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int(i64::from(value))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Str(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Str(value)
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(values: Vec<T>) -> Self {
        FieldValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => write!(f, "null"),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Int(n) => write!(f, "{n}"),
            FieldValue::Float(x) => write!(f, "{x:?}"),
            FieldValue::Str(s) => write!(f, "{s:?}"),
            FieldValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            FieldValue::Record(record) => write!(f, "{}({record})", record.schema_name()),
        }
    }
}

/// An immutable, validated instance of a schema.
///
/// Records are built only by [`crate::validate`]; fields keep the schema's
/// declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    schema: String,
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    pub(crate) fn new(schema: impl Into<String>, fields: Vec<(String, FieldValue)>) -> Self {
        Self {
            schema: schema.into(),
            fields,
        }
    }

    /// Name of the schema this record was validated against.
    pub fn schema_name(&self) -> &str {
        &self.schema
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Space-separated `name=value` pairs.
impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{name}={value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample() -> Record {
        Record::new(
            "User",
            vec![
                ("id".to_string(), FieldValue::Int(1)),
                ("name".to_string(), FieldValue::from("Alice")),
                ("age".to_string(), FieldValue::Null),
            ],
        )
    }

    #[test]
    fn record_lookup_preserves_order() {
        let record = sample();
        assert_eq!(record.schema_name(), "User");
        assert_eq!(record.get("id"), Some(&FieldValue::Int(1)));
        assert!(record.get("missing").is_none());

        let names: Vec<&str> = record.fields().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["id", "name", "age"]);
        assert_eq!(record.len(), 3);
    }

    #[test]
    fn record_display_lists_fields() {
        assert_eq!(sample().to_string(), r#"id=1 name="Alice" age=null"#);
    }

    #[test]
    fn from_json_rejects_objects() {
        assert_eq!(
            FieldValue::from_json(&json!([1, 2.5, "x", null])),
            Some(FieldValue::List(vec![
                FieldValue::Int(1),
                FieldValue::Float(2.5),
                FieldValue::from("x"),
                FieldValue::Null,
            ]))
        );
        assert!(FieldValue::from_json(&json!({"a": 1})).is_none());
        assert!(FieldValue::from_json(&json!([{"a": 1}])).is_none());
    }

    #[test]
    fn option_conversion_maps_none_to_null() {
        assert_eq!(FieldValue::from(None::<i64>), FieldValue::Null);
        assert_eq!(FieldValue::from(Some(25)), FieldValue::Int(25));
        assert_eq!(FieldValue::Int(3).as_f64(), Some(3.0));
    }
}
