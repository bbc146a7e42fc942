//! Aggregated validation failures.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable, machine-readable reason for a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    /// A required field is absent.
    MissingField,
    /// A value does not have the declared type.
    TypeMismatch,
    /// A validator hook rejected the value.
    CustomValidationFailed,
    /// A strict schema received an undeclared key.
    ExtraField,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::MissingField => "missing_field",
            ReasonCode::TypeMismatch => "type_mismatch",
            ReasonCode::CustomValidationFailed => "custom_validation_failed",
            ReasonCode::ExtraField => "extra_field",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failed check, located by its dotted path (`addresses[1].zip_code`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub path: String,
    pub reason: ReasonCode,
    pub message: String,
}

impl Failure {
    pub fn new(path: impl Into<String>, reason: ReasonCode, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason,
            message: message.into(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} [{}]", self.path, self.message, self.reason)
    }
}

/// Every failure found in one validation pass, in field declaration order.
/// Only the validator builds one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    schema: String,
    failures: Vec<Failure>,
}

impl ValidationError {
    pub(crate) fn new(schema: impl Into<String>, failures: Vec<Failure>) -> Self {
        Self {
            schema: schema.into(),
            failures,
        }
    }

    /// Schema the input was validated against.
    pub fn schema_name(&self) -> &str {
        &self.schema
    }

    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Failures carrying the given reason.
    pub fn with_reason(&self, reason: ReasonCode) -> impl Iterator<Item = &Failure> {
        self.failures.iter().filter(move |f| f.reason == reason)
    }

    /// `{"field.path": "message"}` form; messages sharing a path are joined
    /// with `"; "`.
    pub fn field_messages(&self) -> BTreeMap<String, String> {
        let mut out: BTreeMap<String, String> = BTreeMap::new();
        for failure in &self.failures {
            out.entry(failure.path.clone())
                .and_modify(|existing| {
                    existing.push_str("; ");
                    existing.push_str(&failure.message);
                })
                .or_insert_with(|| failure.message.clone());
        }
        out
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = if self.failures.len() == 1 {
            "error"
        } else {
            "errors"
        };
        write!(
            f,
            "{} validation {noun} for {}",
            self.failures.len(),
            self.schema
        )?;
        for failure in &self.failures {
            write!(f, "\n  {failure}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}
