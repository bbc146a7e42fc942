use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::RegistryConfig;
use crate::error::{Result, SchemaError};
use crate::loader::{register_in_dependency_order, ModelDefinition};
use crate::schema::{too_deep, FieldSpec, FieldType, Schema, MAX_TYPE_DEPTH};
use crate::value::FieldValue;

const DEFINITION_SUFFIX: &str = ".model.json";

/// Name-keyed registry of immutable schemas.
///
/// A schema can only reference schemas that are already registered, so
/// every registered schema is fully resolved.
pub struct SchemaRegistry {
    schemas: HashMap<String, Arc<Schema>>,
    config: RegistryConfig,
}

impl SchemaRegistry {
    /// Create an empty registry with default config.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry with explicit config.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            schemas: HashMap::new(),
            config,
        }
    }

    /// Define and register a schema from an ordered list of fields.
    pub fn define(&mut self, name: &str, fields: Vec<FieldSpec>) -> Result<Arc<Schema>> {
        self.define_described(name, None, fields)
    }

    pub(crate) fn define_described(
        &mut self,
        name: &str,
        description: Option<String>,
        fields: Vec<FieldSpec>,
    ) -> Result<Arc<Schema>> {
        if name.trim().is_empty() {
            return Err(SchemaError::InvalidName(
                "schema name must not be empty".to_string(),
            ));
        }
        if self.schemas.contains_key(name) {
            return Err(SchemaError::DuplicateSchema(name.to_string()));
        }

        let mut seen = HashSet::new();
        let mut nested = HashMap::new();
        let mut resolved = Vec::with_capacity(fields.len());

        for mut field in fields {
            if field.name.trim().is_empty() {
                return Err(SchemaError::InvalidName(format!(
                    "schema {name} has a field with an empty name"
                )));
            }
            if !seen.insert(field.name.clone()) {
                return Err(SchemaError::DuplicateField {
                    schema: name.to_string(),
                    field: field.name,
                });
            }

            if field.field_type.depth() > MAX_TYPE_DEPTH {
                debug!(schema = name, field = %field.name, "field type nested too deep");
                return Err(too_deep());
            }

            if let Some(target) = field.field_type.nested_name() {
                let schema =
                    self.schemas
                        .get(target)
                        .ok_or_else(|| SchemaError::UnresolvedNestedSchema {
                            schema: name.to_string(),
                            field: field.name.clone(),
                            target: target.to_string(),
                        })?;
                nested.insert(target.to_string(), Arc::clone(schema));
            }

            field.default = match (field.optional, field.default.take()) {
                (false, Some(_)) => {
                    return Err(SchemaError::DefaultOnRequiredField {
                        schema: name.to_string(),
                        field: field.name.clone(),
                    });
                }
                (false, None) => None,
                (true, default) => {
                    let invalid = |expected: String| SchemaError::InvalidDefault {
                        schema: name.to_string(),
                        field: field.name.clone(),
                        expected,
                    };
                    let default = default.unwrap_or(FieldValue::Null);
                    let normalized = field
                        .field_type
                        .normalize_default(default)
                        .ok_or_else(|| invalid(field.field_type.to_string()))?;
                    let checked = checked_default(&field, normalized).map_err(|(hook, message)| {
                        invalid(format!(
                            "{} accepted by `{hook}` ({message})",
                            field.field_type
                        ))
                    })?;
                    Some(checked)
                }
            };

            resolved.push(field);
        }

        let schema = Arc::new(Schema::new(
            name,
            description,
            resolved,
            nested,
            self.config.strict_mode,
        ));
        debug!(
            schema = name,
            fields = schema.fields().len(),
            strict = schema.is_strict(),
            "defined schema"
        );
        self.schemas.insert(name.to_string(), Arc::clone(&schema));
        Ok(schema)
    }

    /// Register one model definition document. Schemas it references must
    /// already be registered.
    pub fn register_definition(&mut self, definition_json: &str) -> Result<Arc<Schema>> {
        let definition = ModelDefinition::from_json(definition_json)?;
        self.register_model(&definition)
    }

    /// Register a parsed model definition.
    pub fn register_model(&mut self, definition: &ModelDefinition) -> Result<Arc<Schema>> {
        let fields = definition.to_field_specs()?;
        self.define_described(&definition.name, definition.description.clone(), fields)
    }

    /// Load from embedded definition documents, in any order.
    pub fn from_embedded(definitions: &[&str]) -> Result<Self> {
        Self::from_embedded_with_config(definitions, RegistryConfig::default())
    }

    /// Load from embedded definition documents with explicit config.
    pub fn from_embedded_with_config(definitions: &[&str], config: RegistryConfig) -> Result<Self> {
        let mut registry = Self::with_config(config);
        let parsed = definitions
            .iter()
            .map(|text| ModelDefinition::from_json(text))
            .collect::<Result<Vec<_>>>()?;
        register_in_dependency_order(&mut registry, parsed)?;
        Ok(registry)
    }

    /// Load `*.model.json` definitions from a directory.
    pub fn from_directory(path: &Path) -> Result<Self> {
        Self::from_directory_with_config(path, RegistryConfig::default())
    }

    /// Load definitions from a directory with explicit config.
    pub fn from_directory_with_config(path: &Path, config: RegistryConfig) -> Result<Self> {
        let mut registry = Self::with_config(config);
        let mut definitions: Vec<(String, ModelDefinition)> = Vec::new();

        let entries = std::fs::read_dir(path)
            .map_err(|err| SchemaError::LoadFailed(format!("{}: {err}", path.display())))?;

        for entry in entries {
            let entry = entry.map_err(|err| SchemaError::LoadFailed(err.to_string()))?;
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy().into_owned();
            let is_definition_file = file_name.to_ascii_lowercase().ends_with(DEFINITION_SUFFIX);
            let entry_path = entry.path();
            let path_metadata = std::fs::symlink_metadata(&entry_path)
                .map_err(|err| SchemaError::LoadFailed(err.to_string()))?;
            let file_type = path_metadata.file_type();

            if file_type.is_symlink() {
                if is_definition_file {
                    return Err(SchemaError::LoadFailed(format!(
                        "refusing to load definition symlink: {file_name}"
                    )));
                }
                continue;
            }
            if !file_type.is_file() || !is_definition_file {
                debug!(file = %file_name, "skipping non-definition entry");
                continue;
            }

            if definitions.len() >= registry.config.max_schemas_from_directory {
                return Err(SchemaError::LoadFailed(format!(
                    "definition count exceeds configured max ({}): {}",
                    registry.config.max_schemas_from_directory,
                    definitions.len().saturating_add(1)
                )));
            }

            let file = std::fs::File::open(&entry_path).map_err(|err| {
                SchemaError::LoadFailed(format!(
                    "failed opening definition {}: {err}",
                    entry_path.display()
                ))
            })?;
            let opened_metadata = file
                .metadata()
                .map_err(|err| SchemaError::LoadFailed(err.to_string()))?;

            #[cfg(unix)]
            {
                if !same_file_identity(&path_metadata, &opened_metadata) {
                    return Err(SchemaError::LoadFailed(format!(
                        "definition file changed during load: {file_name}"
                    )));
                }
            }

            let max_bytes = registry.config.max_definition_file_size;
            if opened_metadata.len() > max_bytes as u64 {
                return Err(SchemaError::LoadFailed(format!(
                    "definition file too large ({} bytes): {file_name}",
                    opened_metadata.len()
                )));
            }

            let read_limit = u64::try_from(max_bytes.saturating_add(1)).unwrap_or(u64::MAX);
            let mut content = String::new();
            file.take(read_limit)
                .read_to_string(&mut content)
                .map_err(|err| {
                    SchemaError::LoadFailed(format!(
                        "failed reading definition {}: {err}",
                        entry_path.display()
                    ))
                })?;
            if content.len() > max_bytes {
                return Err(SchemaError::LoadFailed(format!(
                    "definition file too large while reading: {file_name}"
                )));
            }

            let definition = ModelDefinition::from_json(&content)
                .map_err(|err| SchemaError::InvalidDefinition(format!("{file_name}: {err}")))?;
            definitions.push((file_name, definition));
        }

        definitions.sort_by(|a, b| a.0.cmp(&b.0));
        let count = definitions.len();
        register_in_dependency_order(
            &mut registry,
            definitions.into_iter().map(|(_, def)| def).collect(),
        )?;

        info!(path = %path.display(), schemas = count, "loaded model definitions");
        Ok(registry)
    }

    /// Look up a schema by name.
    pub fn get(&self, name: &str) -> Option<Arc<Schema>> {
        self.schemas.get(name).cloned()
    }

    /// Look up a schema by name, failing when it is not registered.
    pub fn schema(&self, name: &str) -> Result<Arc<Schema>> {
        self.get(name)
            .ok_or_else(|| SchemaError::UnknownSchema(name.to_string()))
    }

    /// Check if a schema is registered under `name`.
    pub fn has_schema(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Registered schema names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Get registry configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Run a non-null default through the field's hooks, per element for
/// sequence fields, keeping whatever the hooks return.
fn checked_default(
    field: &FieldSpec,
    value: FieldValue,
) -> std::result::Result<FieldValue, (&str, String)> {
    match (&field.field_type, value) {
        (_, FieldValue::Null) => Ok(FieldValue::Null),
        (FieldType::Sequence(_), FieldValue::List(items)) => items
            .into_iter()
            .map(|item| field.apply_validators(item))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(FieldValue::List),
        (_, value) => field.apply_validators(value),
    }
}

#[cfg(unix)]
fn same_file_identity(
    path_metadata: &std::fs::Metadata,
    opened_metadata: &std::fs::Metadata,
) -> bool {
    use std::os::unix::fs::MetadataExt;
    path_metadata.dev() == opened_metadata.dev() && path_metadata.ino() == opened_metadata.ino()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use serde_json::json;

    use super::*;

    const ADDRESS: &str = r#"{
        "name": "Address",
        "fields": [
            { "name": "street", "type": "str" },
            { "name": "city", "type": "str" },
            { "name": "zip_code", "type": "str" }
        ]
    }"#;

    const USER: &str = r#"{
        "name": "UserWithAddress",
        "description": "User with postal addresses",
        "fields": [
            { "name": "id", "type": "int" },
            { "name": "name", "type": "str", "validators": [{ "kind": "min_length", "min": 2 }] },
            { "name": "email", "type": "str", "validators": [{ "kind": "email" }] },
            { "name": "addresses", "type": "list[Address]" }
        ]
    }"#;

    fn address_fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::required("street", FieldType::String),
            FieldSpec::required("city", FieldType::String),
        ]
    }

    #[test]
    fn define_and_lookup() {
        let mut registry = SchemaRegistry::new();
        let schema = registry.define("Address", address_fields()).unwrap();

        assert_eq!(schema.name(), "Address");
        assert!(registry.has_schema("Address"));
        assert!(Arc::ptr_eq(&schema, &registry.schema("Address").unwrap()));
        assert!(matches!(
            registry.schema("Missing"),
            Err(SchemaError::UnknownSchema(name)) if name == "Missing"
        ));
    }

    #[test]
    fn duplicate_field_rejected() {
        let mut registry = SchemaRegistry::new();
        let result = registry.define(
            "User",
            vec![
                FieldSpec::required("id", FieldType::Integer),
                FieldSpec::required("id", FieldType::String),
            ],
        );
        assert!(matches!(
            result,
            Err(SchemaError::DuplicateField { field, .. }) if field == "id"
        ));
        assert!(!registry.has_schema("User"));
    }

    #[test]
    fn unresolved_nested_reference_rejected() {
        let mut registry = SchemaRegistry::new();
        let result = registry.define(
            "User",
            vec![FieldSpec::required(
                "addresses",
                FieldType::sequence(FieldType::nested("Address")),
            )],
        );
        assert!(matches!(
            result,
            Err(SchemaError::UnresolvedNestedSchema { field, target, .. })
                if field == "addresses" && target == "Address"
        ));
    }

    #[test]
    fn required_field_with_default_rejected() {
        let mut registry = SchemaRegistry::new();
        let result = registry.define(
            "User",
            vec![FieldSpec::required("age", FieldType::Integer).with_default(25)],
        );
        assert!(matches!(
            result,
            Err(SchemaError::DefaultOnRequiredField { field, .. }) if field == "age"
        ));
    }

    #[test]
    fn default_must_match_declared_type() {
        let mut registry = SchemaRegistry::new();
        let result = registry.define(
            "User",
            vec![FieldSpec::optional("age", FieldType::Integer).with_default("old")],
        );
        assert!(matches!(result, Err(SchemaError::InvalidDefault { .. })));

        let schema = registry
            .define(
                "Ratio",
                vec![FieldSpec::optional("value", FieldType::Float).with_default(1)],
            )
            .unwrap();
        assert_eq!(
            schema.field("value").unwrap().default_value(),
            Some(&FieldValue::Float(1.0))
        );
    }

    #[test]
    fn defaults_must_satisfy_field_hooks() {
        let result = SchemaRegistry::from_embedded(&[r#"{
            "name": "Profile",
            "fields": [{
                "name": "tags",
                "type": "list[str]",
                "optional": true,
                "default": ["ok", ""],
                "validators": [{ "kind": "min_length", "min": 1 }]
            }]
        }"#]);
        assert!(matches!(
            result,
            Err(SchemaError::InvalidDefault { field, expected, .. })
                if field == "tags" && expected.contains("min_length")
        ));

        let mut registry = SchemaRegistry::new();
        let schema = registry
            .define(
                "Profile",
                vec![FieldSpec::optional("tags", FieldType::sequence(FieldType::String))
                    .with_default(vec![" Rust "])
                    .with_validator(crate::hook::trim())],
            )
            .unwrap();
        assert_eq!(
            schema.field("tags").unwrap().default_value(),
            Some(&FieldValue::List(vec![FieldValue::from("Rust")]))
        );
    }

    #[test]
    fn deeply_nested_types_rejected() {
        let depth = 40_000;
        let definition = format!(
            r#"{{"name": "Grid", "fields": [{{"name": "cells", "type": "{}int{}"}}]}}"#,
            "list[".repeat(depth),
            "]".repeat(depth)
        );
        assert!(matches!(
            SchemaRegistry::from_embedded(&[definition.as_str()]),
            Err(SchemaError::InvalidType(_))
        ));

        let built = (0..=MAX_TYPE_DEPTH).fold(FieldType::Integer, |inner, _| {
            FieldType::sequence(inner)
        });
        let mut registry = SchemaRegistry::new();
        assert!(matches!(
            registry.define("Grid", vec![FieldSpec::required("cells", built)]),
            Err(SchemaError::InvalidType(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn duplicate_and_empty_names_rejected() {
        let mut registry = SchemaRegistry::new();
        registry.define("Address", address_fields()).unwrap();

        assert!(matches!(
            registry.define("Address", address_fields()),
            Err(SchemaError::DuplicateSchema(_))
        ));
        assert!(matches!(
            registry.define("  ", address_fields()),
            Err(SchemaError::InvalidName(_))
        ));
        assert!(matches!(
            registry.define("Blank", vec![FieldSpec::required("", FieldType::Integer)]),
            Err(SchemaError::InvalidName(_))
        ));
    }

    #[test]
    fn strict_mode_is_stamped_on_schemas() {
        let mut strict = SchemaRegistry::with_config(RegistryConfig {
            strict_mode: true,
            ..RegistryConfig::default()
        });
        assert!(strict.define("Address", address_fields()).unwrap().is_strict());

        let mut lenient = SchemaRegistry::new();
        assert!(!lenient.define("Address", address_fields()).unwrap().is_strict());
    }

    #[test]
    fn from_embedded_resolves_out_of_order_definitions() {
        let registry = SchemaRegistry::from_embedded(&[USER, ADDRESS]).unwrap();

        assert_eq!(registry.names(), vec!["Address", "UserWithAddress"]);
        let user = registry.schema("UserWithAddress").unwrap();
        assert_eq!(user.description(), Some("User with postal addresses"));
        assert_eq!(user.dependencies(), vec!["Address"]);

        let err = user
            .validate(&json!({
                "id": 2,
                "name": "B",
                "email": "bethany@example.com",
                "addresses": [{"street": "1 Main", "city": "NYC"}]
            }))
            .unwrap_err();
        let paths: Vec<&str> = err.failures().iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["name", "addresses[0].zip_code"]);
    }

    #[test]
    fn register_definition_requires_dependencies_first() {
        let mut registry = SchemaRegistry::new();
        assert!(matches!(
            registry.register_definition(USER),
            Err(SchemaError::UnresolvedNestedSchema { .. })
        ));
        registry.register_definition(ADDRESS).unwrap();
        registry.register_definition(USER).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn from_directory_loads_and_validates() {
        let dir = make_temp_definition_dir("from-directory");
        write_definition(&dir, "user.model.json", USER);
        write_definition(&dir, "address.model.json", ADDRESS);
        write_definition(&dir, "notes.txt", "not a definition");

        let registry = SchemaRegistry::from_directory(&dir).unwrap();
        assert_eq!(registry.names(), vec!["Address", "UserWithAddress"]);

        let record = registry
            .schema("Address")
            .unwrap()
            .validate(&json!({"street": "1 Main", "city": "NYC", "zip_code": "10001"}))
            .unwrap();
        assert_eq!(record.get("zip_code"), Some(&FieldValue::from("10001")));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn malformed_definition_file_names_the_file() {
        let dir = make_temp_definition_dir("malformed");
        write_definition(&dir, "broken.model.json", r#"{"name": "X", "fields": [{"name": "a"}]}"#);

        match SchemaRegistry::from_directory(&dir) {
            Err(SchemaError::InvalidDefinition(message)) => {
                assert!(message.contains("broken.model.json"));
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("malformed definition should fail"),
        }

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_directory_fails_load() {
        let dir = std::env::temp_dir().join("modelcheck-definitely-missing-dir");
        assert!(matches!(
            SchemaRegistry::from_directory(&dir),
            Err(SchemaError::LoadFailed(_))
        ));
    }

    #[test]
    fn definition_count_limit_is_enforced() {
        let dir = make_temp_definition_dir("count-limit");
        write_definition(&dir, "address.model.json", ADDRESS);
        write_definition(&dir, "user.model.json", USER);

        let config = RegistryConfig {
            max_schemas_from_directory: 1,
            ..RegistryConfig::default()
        };
        let result = SchemaRegistry::from_directory_with_config(&dir, config);
        assert!(matches!(result, Err(SchemaError::LoadFailed(_))));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn definition_file_size_limit_is_enforced() {
        let dir = make_temp_definition_dir("size-limit");
        write_definition(&dir, "address.model.json", ADDRESS);

        let config = RegistryConfig {
            max_definition_file_size: 8,
            ..RegistryConfig::default()
        };
        let result = SchemaRegistry::from_directory_with_config(&dir, config);
        assert!(matches!(result, Err(SchemaError::LoadFailed(_))));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_definition_is_rejected() {
        let dir = make_temp_definition_dir("symlink");
        let target = dir.join("target.json");
        std::fs::write(&target, ADDRESS.as_bytes()).unwrap();
        std::os::unix::fs::symlink(&target, dir.join("address.model.json")).unwrap();

        let result = SchemaRegistry::from_directory(&dir);
        assert!(matches!(result, Err(SchemaError::LoadFailed(_))));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(unix)]
    #[test]
    fn same_file_identity_distinguishes_replaced_file() {
        let dir = make_temp_definition_dir("identity-check");
        let first = dir.join("first.json");
        let second = dir.join("second.json");
        std::fs::write(&first, ADDRESS).unwrap();
        std::fs::write(&second, ADDRESS).unwrap();

        let first_meta = std::fs::symlink_metadata(&first).unwrap();
        let opened_first_meta = std::fs::File::open(&first).unwrap().metadata().unwrap();
        let opened_second_meta = std::fs::File::open(&second).unwrap().metadata().unwrap();

        assert!(same_file_identity(&first_meta, &opened_first_meta));
        assert!(!same_file_identity(&first_meta, &opened_second_meta));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn config_access() {
        let config = RegistryConfig {
            strict_mode: true,
            max_schemas_from_directory: 4,
            max_definition_file_size: 1024,
        };
        let registry = SchemaRegistry::with_config(config);
        assert_eq!(registry.config(), &config);
        assert!(registry.is_empty());
    }

    fn make_temp_definition_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "modelcheck-{tag}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_definition(dir: &Path, file_name: &str, contents: &str) {
        std::fs::write(dir.join(file_name), contents.as_bytes()).unwrap();
    }
}
