//! Declarative record schemas with accumulating validation.
//!
//! Define named schemas with typed fields, nested schemas, defaults and
//! per-field validator hooks, then validate untyped JSON input against them.
//! A validation pass reports every failure it finds, each located by a
//! dotted path such as `addresses[1].zip_code`.
//!
//! ```
//! use modelcheck_core::{FieldSpec, FieldType, SchemaRegistry};
//! use serde_json::json;
//!
//! let mut registry = SchemaRegistry::new();
//! let user = registry
//!     .define(
//!         "User",
//!         vec![
//!             FieldSpec::required("id", FieldType::Integer),
//!             FieldSpec::optional("age", FieldType::Integer),
//!         ],
//!     )
//!     .unwrap();
//!
//! let record = user.validate(&json!({"id": 1})).unwrap();
//! assert_eq!(record.to_json(), json!({"id": 1, "age": null}));
//! ```

pub mod config;
pub mod error;
pub mod hook;
pub mod loader;
pub mod projection;
pub mod registry;
pub mod report;
pub mod schema;
pub mod validator;
pub mod value;

pub use config::RegistryConfig;
pub use error::{Result, SchemaError};
pub use hook::{HookSpec, ValidatorHook};
pub use loader::{FieldDefinition, ModelDefinition};
pub use projection::{to_plain_mapping, to_plain_value};
pub use registry::SchemaRegistry;
pub use report::{Failure, ReasonCode, ValidationError};
pub use schema::{FieldSpec, FieldType, Schema};
pub use validator::{validate, validate_value, ROOT_PATH};
pub use value::{FieldValue, Record};
