use std::fmt;
use std::io;

use modelcheck_core::SchemaError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const HEALTH_CHECK_FAILED: i32 = 30;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound => FAILURE,
        io::ErrorKind::InvalidData => DATA_INVALID,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn schema_error(context: &str, err: SchemaError) -> CliError {
    let code = match &err {
        SchemaError::UnknownSchema(_) => USAGE,
        SchemaError::LoadFailed(_) => FAILURE,
        SchemaError::InvalidJson(_)
        | SchemaError::InvalidDefinition(_)
        | SchemaError::InvalidType(_)
        | SchemaError::InvalidName(_)
        | SchemaError::DuplicateField { .. }
        | SchemaError::DuplicateSchema(_)
        | SchemaError::UnresolvedNestedSchema { .. }
        | SchemaError::DefaultOnRequiredField { .. }
        | SchemaError::InvalidDefault { .. } => DATA_INVALID,
    };
    CliError::new(code, format!("{context}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_schema_errors_to_exit_codes() {
        let err = schema_error("load", SchemaError::UnknownSchema("User".into()));
        assert_eq!(err.code, USAGE);
        assert!(err.message.starts_with("load: "));

        let err = schema_error("load", SchemaError::LoadFailed("gone".into()));
        assert_eq!(err.code, FAILURE);

        let err = schema_error("load", SchemaError::DuplicateSchema("User".into()));
        assert_eq!(err.code, DATA_INVALID);
    }

    #[test]
    fn maps_io_errors_to_exit_codes() {
        let denied = io::Error::from(io::ErrorKind::PermissionDenied);
        assert_eq!(io_error("read", denied).code, PERMISSION_DENIED);

        let other = io::Error::other("boom");
        assert_eq!(io_error("read", other).code, INTERNAL);
    }
}
