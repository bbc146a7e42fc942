//! Declarative record schemas with accumulating validation.
//!
//! modelcheck validates untyped JSON input against named schemas and reports
//! every failure in one pass, each located by a path like
//! `addresses[1].zip_code`.
//!
//! # Crate Structure
//!
//! - [`core`]: schemas, registry, validator, hooks and projection
//! - The `modelcheck` binary (behind the `cli` feature) validates JSON
//!   documents against a directory of `*.model.json` definitions.

/// Re-export core types.
pub mod core {
    pub use modelcheck_core::*;
}

pub use modelcheck_core::{
    hook, to_plain_mapping, validate, FieldSpec, FieldType, FieldValue, HookSpec,
    ModelDefinition, ReasonCode, Record, RegistryConfig, Schema, SchemaError, SchemaRegistry,
    ValidationError, ValidatorHook,
};
