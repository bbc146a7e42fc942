use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::Value;

use crate::error::SchemaError;
use crate::hook::ValidatorHook;
use crate::report::ValidationError;
use crate::value::{FieldValue, Record};

/// Deepest `list[...]` nesting a field type may have.
pub const MAX_TYPE_DEPTH: usize = 32;

/// Declared type of a field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    Integer,
    String,
    Boolean,
    Float,
    /// Reference to another registered schema, by name.
    Nested(String),
    /// Homogeneous sequence; boxed to allow `list[list[T]]`.
    Sequence(Box<FieldType>),
}

impl FieldType {
    pub fn nested(schema: impl Into<String>) -> Self {
        FieldType::Nested(schema.into())
    }

    pub fn sequence(element: FieldType) -> Self {
        FieldType::Sequence(Box::new(element))
    }

    /// Name of the schema this type refers to, looking through sequences.
    pub fn nested_name(&self) -> Option<&str> {
        match self.element() {
            FieldType::Nested(name) => Some(name),
            _ => None,
        }
    }

    /// Number of `list[...]` layers around the element type.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self;
        while let FieldType::Sequence(inner) = current {
            depth += 1;
            current = inner;
        }
        depth
    }

    fn element(&self) -> &FieldType {
        let mut current = self;
        while let FieldType::Sequence(inner) = current {
            current = inner;
        }
        current
    }

    /// Check a default against this type. Null is accepted at the top level
    /// (optional fields); integers widen to floats. Record defaults are
    /// never accepted.
    pub(crate) fn normalize_default(&self, value: FieldValue) -> Option<FieldValue> {
        if value.is_null() {
            return Some(value);
        }
        self.normalize_literal(value)
    }

    fn normalize_literal(&self, value: FieldValue) -> Option<FieldValue> {
        match (self, value) {
            (FieldType::Integer, v @ FieldValue::Int(_)) => Some(v),
            (FieldType::String, v @ FieldValue::Str(_)) => Some(v),
            (FieldType::Boolean, v @ FieldValue::Bool(_)) => Some(v),
            (FieldType::Float, FieldValue::Int(n)) => Some(FieldValue::Float(n as f64)),
            (FieldType::Float, v @ FieldValue::Float(_)) => Some(v),
            (FieldType::Sequence(inner), FieldValue::List(items)) => items
                .into_iter()
                .map(|item| inner.normalize_literal(item))
                .collect::<Option<Vec<_>>>()
                .map(FieldValue::List),
            _ => None,
        }
    }
}

/// Parses the type grammar used by definition files: `int`, `integer`,
/// `str`, `string`, `bool`, `boolean`, `float`, `list[T]`, or a schema name.
impl FromStr for FieldType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut text = s.trim();
        let mut depth = 0;
        while let Some(inner) = text
            .strip_prefix("list[")
            .and_then(|rest| rest.strip_suffix(']'))
        {
            depth += 1;
            if depth > MAX_TYPE_DEPTH {
                return Err(too_deep());
            }
            text = inner.trim();
        }

        let element = match text {
            "int" | "integer" => FieldType::Integer,
            "str" | "string" => FieldType::String,
            "bool" | "boolean" => FieldType::Boolean,
            "float" => FieldType::Float,
            name if is_identifier(name) => FieldType::Nested(name.to_string()),
            _ => return Err(SchemaError::InvalidType(s.to_string())),
        };
        Ok((0..depth).fold(element, |inner, _| FieldType::sequence(inner)))
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Integer => write!(f, "integer"),
            FieldType::String => write!(f, "string"),
            FieldType::Boolean => write!(f, "boolean"),
            FieldType::Float => write!(f, "float"),
            FieldType::Nested(name) => write!(f, "{name}"),
            FieldType::Sequence(inner) => write!(f, "list[{inner}]"),
        }
    }
}

pub(crate) fn too_deep() -> SchemaError {
    SchemaError::InvalidType(format!(
        "list[...] nested more than {MAX_TYPE_DEPTH} levels"
    ))
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// One field of a schema.
///
/// Build with [`FieldSpec::required`] or [`FieldSpec::optional`]; the
/// registry checks the result when the owning schema is defined.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub(crate) name: String,
    pub(crate) field_type: FieldType,
    pub(crate) optional: bool,
    pub(crate) default: Option<FieldValue>,
    pub(crate) validators: Vec<ValidatorHook>,
}

impl FieldSpec {
    /// A field that must be present in every input.
    pub fn required(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            optional: false,
            default: None,
            validators: Vec::new(),
        }
    }

    /// A field that may be absent; it defaults to null unless
    /// [`with_default`](Self::with_default) says otherwise.
    pub fn optional(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            optional: true,
            default: Some(FieldValue::Null),
            validators: Vec::new(),
        }
    }

    pub fn with_default(mut self, value: impl Into<FieldValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Append a hook. Hooks run in the order they were added.
    pub fn with_validator(mut self, hook: ValidatorHook) -> Self {
        self.validators.push(hook);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn default_value(&self) -> Option<&FieldValue> {
        self.default.as_ref()
    }

    pub fn validators(&self) -> &[ValidatorHook] {
        &self.validators
    }

    /// Run the hook chain over one value, or one element of a sequence
    /// field. The first rejection stops the chain and names its hook.
    pub(crate) fn apply_validators(
        &self,
        mut value: FieldValue,
    ) -> Result<FieldValue, (&str, String)> {
        for hook in &self.validators {
            value = hook
                .apply(&self.name, value)
                .map_err(|message| (hook.name(), message))?;
        }
        Ok(value)
    }
}

/// A named, immutable record type.
///
/// Only [`crate::SchemaRegistry`] builds schemas, so every nested reference
/// is resolved by the time a schema can be validated against.
#[derive(Debug)]
pub struct Schema {
    name: String,
    description: Option<String>,
    fields: Vec<FieldSpec>,
    nested: HashMap<String, Arc<Schema>>,
    strict: bool,
}

impl Schema {
    pub(crate) fn new(
        name: impl Into<String>,
        description: Option<String>,
        fields: Vec<FieldSpec>,
        nested: HashMap<String, Arc<Schema>>,
        strict: bool,
    ) -> Self {
        Self {
            name: name.into(),
            description,
            fields,
            nested,
            strict,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Whether undeclared input keys are reported.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Names of directly referenced schemas, sorted.
    pub fn dependencies(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.nested.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub(crate) fn nested_schema(&self, name: &str) -> Option<&Schema> {
        self.nested.get(name).map(Arc::as_ref)
    }

    /// Validate a JSON value against this schema.
    pub fn validate(&self, input: &Value) -> Result<Record, ValidationError> {
        crate::validator::validate_value(self, input)
    }
}
