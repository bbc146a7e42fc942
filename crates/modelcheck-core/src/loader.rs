//! JSON model definitions.
//!
//! One document describes one model:
//!
//! ```json
//! {
//!   "name": "User",
//!   "fields": [
//!     { "name": "id", "type": "int" },
//!     { "name": "age", "type": "int", "optional": true, "default": null },
//!     { "name": "addresses", "type": "list[Address]" },
//!     { "name": "name", "type": "str", "validators": [{ "kind": "min_length", "min": 2 }] }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, SchemaError};
use crate::hook::HookSpec;
use crate::registry::SchemaRegistry;
use crate::schema::{FieldSpec, FieldType};
use crate::value::FieldValue;

/// A parsed model definition document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fields: Vec<FieldDefinition>,
}

/// One field entry of a [`ModelDefinition`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDefinition {
    pub name: String,
    /// Type expression, e.g. `int` or `list[Address]`.
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub optional: bool,
    /// Literal default; `null` and absent are the same.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<HookSpec>,
}

impl ModelDefinition {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Names of the schemas this definition references.
    pub fn dependencies(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for field in &self.fields {
            let field_type: FieldType = field.field_type.parse()?;
            if let Some(name) = field_type.nested_name() {
                if !names.iter().any(|existing| existing == name) {
                    names.push(name.to_string());
                }
            }
        }
        Ok(names)
    }

    /// Build field specs, attaching built-in hooks.
    pub fn to_field_specs(&self) -> Result<Vec<FieldSpec>> {
        self.fields
            .iter()
            .map(|field| field.to_field_spec(&self.name))
            .collect()
    }
}

impl FieldDefinition {
    fn to_field_spec(&self, schema: &str) -> Result<FieldSpec> {
        let field_type: FieldType = self.field_type.parse()?;
        let expected = field_type.to_string();

        let mut spec = if self.optional {
            FieldSpec::optional(&self.name, field_type)
        } else {
            FieldSpec::required(&self.name, field_type)
        };

        if let Some(default) = &self.default {
            let value = FieldValue::from_json(default).ok_or_else(|| SchemaError::InvalidDefault {
                schema: schema.to_string(),
                field: self.name.clone(),
                expected,
            })?;
            spec = spec.with_default(value);
        }

        for hook in &self.validators {
            spec = spec.with_validator(hook.build());
        }
        Ok(spec)
    }
}

/// Register definitions so that each one follows the schemas it references.
pub(crate) fn register_in_dependency_order(
    registry: &mut SchemaRegistry,
    definitions: Vec<ModelDefinition>,
) -> Result<()> {
    let mut pending = definitions;

    while !pending.is_empty() {
        let before = pending.len();
        let mut deferred = Vec::new();

        for definition in pending {
            let ready = definition
                .dependencies()?
                .iter()
                .all(|name| registry.has_schema(name));
            if ready {
                registry.register_model(&definition)?;
            } else {
                deferred.push(definition);
            }
        }

        if deferred.len() == before {
            return Err(first_unresolved(registry, &deferred));
        }
        if !deferred.is_empty() {
            debug!(remaining = deferred.len(), "deferring definitions with unmet references");
        }
        pending = deferred;
    }

    Ok(())
}

fn first_unresolved(registry: &SchemaRegistry, stuck: &[ModelDefinition]) -> SchemaError {
    for definition in stuck {
        for field in &definition.fields {
            let Ok(field_type) = field.field_type.parse::<FieldType>() else {
                continue;
            };
            if let Some(target) = field_type.nested_name() {
                if !registry.has_schema(target) {
                    return SchemaError::UnresolvedNestedSchema {
                        schema: definition.name.clone(),
                        field: field.name.clone(),
                        target: target.to_string(),
                    };
                }
            }
        }
    }
    SchemaError::InvalidDefinition("definitions could not be ordered".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_field_entries() {
        let definition = ModelDefinition::from_json(
            r#"{
                "name": "User",
                "fields": [
                    { "name": "id", "type": "int" },
                    { "name": "age", "type": "int", "optional": true, "default": 18 },
                    { "name": "addresses", "type": "list[Address]" },
                    { "name": "billing", "type": "Address", "optional": true }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(definition.dependencies().unwrap(), vec!["Address"]);

        let specs = definition.to_field_specs().unwrap();
        assert_eq!(specs.len(), 4);
        assert!(!specs[0].is_optional());
        assert_eq!(specs[1].default_value(), Some(&FieldValue::Int(18)));
        assert_eq!(
            specs[2].field_type(),
            &FieldType::sequence(FieldType::nested("Address"))
        );
        assert_eq!(specs[3].default_value(), Some(&FieldValue::Null));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = ModelDefinition::from_json(
            r#"{"name": "User", "fields": [], "extra": true}"#,
        );
        assert!(matches!(result, Err(SchemaError::InvalidJson(_))));

        let result = ModelDefinition::from_json(
            r#"{"name": "User", "fields": [{"name": "id", "type": "int", "requried": true}]}"#,
        );
        assert!(matches!(result, Err(SchemaError::InvalidJson(_))));
    }

    #[test]
    fn bad_type_expression_is_reported() {
        let definition = ModelDefinition::from_json(
            r#"{"name": "User", "fields": [{"name": "id", "type": "list[int"}]}"#,
        )
        .unwrap();
        assert!(matches!(
            definition.to_field_specs(),
            Err(SchemaError::InvalidType(_))
        ));
    }

    #[test]
    fn object_default_is_invalid() {
        let definition = ModelDefinition::from_json(
            r#"{"name": "User", "fields": [{"name": "meta", "type": "str", "optional": true, "default": {"a": 1}}]}"#,
        )
        .unwrap();
        assert!(matches!(
            definition.to_field_specs(),
            Err(SchemaError::InvalidDefault { .. })
        ));
    }

    #[test]
    fn cycles_surface_as_unresolved_references() {
        let a = ModelDefinition::from_json(
            r#"{"name": "A", "fields": [{"name": "b", "type": "B"}]}"#,
        )
        .unwrap();
        let b = ModelDefinition::from_json(
            r#"{"name": "B", "fields": [{"name": "a", "type": "list[A]"}]}"#,
        )
        .unwrap();

        let mut registry = SchemaRegistry::new();
        let err = register_in_dependency_order(&mut registry, vec![a, b]).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::UnresolvedNestedSchema { schema, target, .. }
                if schema == "A" && target == "B"
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn definitions_serialize_back() {
        let definition = ModelDefinition {
            name: "Tag".to_string(),
            description: None,
            fields: vec![FieldDefinition {
                name: "label".to_string(),
                field_type: "str".to_string(),
                optional: false,
                default: None,
                validators: vec![HookSpec::Trim],
            }],
        };
        let json = serde_json::to_value(&definition).unwrap();
        assert_eq!(json["fields"][0]["type"], "str");
        assert_eq!(json["fields"][0]["validators"][0]["kind"], "trim");
        assert!(json.get("description").is_none());
    }
}
