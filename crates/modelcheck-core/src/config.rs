/// Controls how the registry builds and loads schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// When true, schemas defined through the registry reject input keys
    /// they do not declare.
    pub strict_mode: bool,
    /// Maximum number of definitions loaded from a directory.
    pub max_schemas_from_directory: usize,
    /// Maximum bytes allowed per definition file loaded from a directory.
    pub max_definition_file_size: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            strict_mode: false,
            max_schemas_from_directory: 256,
            max_definition_file_size: 256 * 1024,
        }
    }
}
