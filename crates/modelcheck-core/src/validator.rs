//! The validation pass.
//!
//! Every declared field is checked, nested schemas and sequences included,
//! and all failures are collected before returning. Nothing short-circuits
//! on the first bad field.

use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::report::{Failure, ReasonCode, ValidationError};
use crate::schema::{FieldSpec, FieldType, Schema};
use crate::value::{FieldValue, Record};

/// Path reported when the input itself is not an object.
pub const ROOT_PATH: &str = "$root";

/// Validate an input mapping against a schema.
pub fn validate(schema: &Schema, input: &Map<String, Value>) -> Result<Record, ValidationError> {
    let mut failures = Vec::new();
    let record = validate_object(schema, input, "", &mut failures);

    if failures.is_empty() {
        debug!(schema = schema.name(), "validation passed");
        Ok(record)
    } else {
        debug!(
            schema = schema.name(),
            failures = failures.len(),
            "validation failed"
        );
        Err(ValidationError::new(schema.name(), failures))
    }
}

/// Validate any JSON value; non-objects fail with a single type mismatch at
/// [`ROOT_PATH`].
pub fn validate_value(schema: &Schema, input: &Value) -> Result<Record, ValidationError> {
    match input.as_object() {
        Some(map) => validate(schema, map),
        None => {
            debug!(schema = schema.name(), "validation input is not an object");
            Err(ValidationError::new(
                schema.name(),
                vec![type_mismatch(ROOT_PATH, "object", input)],
            ))
        }
    }
}

fn validate_object(
    schema: &Schema,
    input: &Map<String, Value>,
    prefix: &str,
    failures: &mut Vec<Failure>,
) -> Record {
    let mut values = Vec::with_capacity(schema.fields().len());

    for field in schema.fields() {
        let path = child_path(prefix, field.name());
        let value = match input.get(field.name()) {
            None => match field.default_value() {
                Some(default) if field.is_optional() => Some(default.clone()),
                _ => {
                    failures.push(Failure::new(
                        path,
                        ReasonCode::MissingField,
                        "field required",
                    ));
                    None
                }
            },
            Some(Value::Null) if field.is_optional() => Some(FieldValue::Null),
            Some(raw) => check_field(schema, field, raw, &path, failures),
        };

        if let Some(value) = value {
            values.push((field.name().to_string(), value));
        }
    }

    if schema.is_strict() {
        for key in input.keys() {
            if schema.field(key).is_none() {
                failures.push(Failure::new(
                    child_path(prefix, key),
                    ReasonCode::ExtraField,
                    "extra fields not permitted",
                ));
            }
        }
    }

    Record::new(schema.name(), values)
}

/// Type-check one present field and run its hooks. Sequence fields run the
/// hooks once per element.
fn check_field(
    schema: &Schema,
    field: &FieldSpec,
    raw: &Value,
    path: &str,
    failures: &mut Vec<Failure>,
) -> Option<FieldValue> {
    let FieldType::Sequence(element_type) = field.field_type() else {
        let value = check_type(schema, field.field_type(), raw, path, failures)?;
        return run_hooks(field, value, path, failures);
    };

    let Some(items) = raw.as_array() else {
        failures.push(type_mismatch(path, field.field_type(), raw));
        return None;
    };

    let before = failures.len();
    let mut values = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let item_path = element_path(path, index);
        if let Some(value) = check_type(schema, element_type, item, &item_path, failures) {
            if let Some(value) = run_hooks(field, value, &item_path, failures) {
                values.push(value);
            }
        }
    }

    (failures.len() == before).then_some(FieldValue::List(values))
}

fn check_type(
    schema: &Schema,
    expected: &FieldType,
    raw: &Value,
    path: &str,
    failures: &mut Vec<Failure>,
) -> Option<FieldValue> {
    let accepted = match (expected, raw) {
        (FieldType::Integer, Value::Number(n)) => n.as_i64().map(FieldValue::Int),
        (FieldType::Float, Value::Number(n)) => n.as_f64().map(FieldValue::Float),
        (FieldType::String, Value::String(s)) => Some(FieldValue::Str(s.clone())),
        (FieldType::Boolean, Value::Bool(b)) => Some(FieldValue::Bool(*b)),
        (FieldType::Nested(name), Value::Object(map)) => {
            let Some(nested) = schema.nested_schema(name) else {
                unreachable!("schema {} was registered without `{name}`", schema.name());
            };
            trace!(schema = nested.name(), path, "validating nested record");
            let before = failures.len();
            let record = validate_object(nested, map, path, failures);
            return (failures.len() == before).then_some(FieldValue::Record(record));
        }
        (FieldType::Sequence(inner), Value::Array(items)) => {
            let before = failures.len();
            let values: Vec<FieldValue> = items
                .iter()
                .enumerate()
                .filter_map(|(index, item)| {
                    check_type(schema, inner, item, &element_path(path, index), failures)
                })
                .collect();
            return (failures.len() == before).then_some(FieldValue::List(values));
        }
        _ => None,
    };

    if accepted.is_none() {
        failures.push(type_mismatch(path, expected, raw));
    }
    accepted
}

fn run_hooks(
    field: &FieldSpec,
    value: FieldValue,
    path: &str,
    failures: &mut Vec<Failure>,
) -> Option<FieldValue> {
    match field.apply_validators(value) {
        Ok(value) => Some(value),
        Err((hook, message)) => {
            trace!(hook, path, "validator hook rejected value");
            failures.push(Failure::new(
                path,
                ReasonCode::CustomValidationFailed,
                message,
            ));
            None
        }
    }
}

fn type_mismatch(path: &str, expected: impl std::fmt::Display, actual: &Value) -> Failure {
    let message = match actual {
        Value::Number(n) if n.is_u64() && n.as_i64().is_none() => {
            format!("expected {expected}, got integer outside the 64-bit signed range")
        }
        _ => format!("expected {expected}, got {}", json_kind(actual)),
    };
    Failure::new(path, ReasonCode::TypeMismatch, message)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "float",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

fn child_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{prefix}.{field}")
    }
}

fn element_path(path: &str, index: usize) -> String {
    format!("{path}[{index}]")
}
