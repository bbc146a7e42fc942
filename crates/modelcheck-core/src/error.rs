/// Errors raised while defining, loading, or looking up schemas.
///
/// Data problems found while validating input are never reported here; they
/// come back as [`crate::ValidationError`].
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// A field name appears more than once in a schema.
    #[error("schema {schema}: duplicate field `{field}`")]
    DuplicateField { schema: String, field: String },

    /// A nested field references a schema that is not registered.
    #[error("schema {schema}: field `{field}` references unknown schema `{target}`")]
    UnresolvedNestedSchema {
        schema: String,
        field: String,
        target: String,
    },

    /// A required field declares a default value.
    #[error("schema {schema}: required field `{field}` cannot declare a default")]
    DefaultOnRequiredField { schema: String, field: String },

    /// A default value does not conform to the field's declared type.
    #[error("schema {schema}: default for `{field}` is not a valid {expected}")]
    InvalidDefault {
        schema: String,
        field: String,
        expected: String,
    },

    /// A schema or field name is empty.
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// A schema with the same name is already registered.
    #[error("schema {0} is already registered")]
    DuplicateSchema(String),

    /// No schema registered under the given name.
    #[error("no schema registered under `{0}`")]
    UnknownSchema(String),

    /// A type expression could not be parsed.
    #[error("invalid field type `{0}`")]
    InvalidType(String),

    /// A model definition document is malformed.
    #[error("invalid model definition: {0}")]
    InvalidDefinition(String),

    /// Definition files could not be read.
    #[error("failed to load definitions: {0}")]
    LoadFailed(String),

    /// A definition document is not valid JSON.
    #[error("definition is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SchemaError>;
