use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};

use modelcheck_core::{RegistryConfig, SchemaRegistry};

use crate::exit::{schema_error, CliResult};
use crate::output::OutputFormat;

pub mod doctor;
pub mod models;
pub mod validate;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a JSON document against a model.
    Validate(ValidateArgs),
    /// List models loaded from a definition directory.
    Models(ModelsArgs),
    /// Show version information.
    Version(VersionArgs),
    /// Run local environment health checks.
    Doctor(DoctorArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Validate(args) => validate::run(args, format),
        Command::Models(args) => models::run(args, format),
        Command::Version(args) => version::run(args),
        Command::Doctor(args) => doctor::run(args, format),
    }
}

pub(crate) fn load_registry(dir: &Path, strict: bool) -> CliResult<SchemaRegistry> {
    let config = RegistryConfig {
        strict_mode: strict,
        ..RegistryConfig::default()
    };
    SchemaRegistry::from_directory_with_config(dir, config)
        .map_err(|err| schema_error(&format!("load {}", dir.display()), err))
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// JSON document to validate (`-` reads stdin).
    #[arg(conflicts_with = "json", required_unless_present = "json")]
    pub file: Option<PathBuf>,
    /// Inline JSON document.
    #[arg(long)]
    pub json: Option<String>,
    /// Directory of `*.model.json` definitions.
    #[arg(long, value_name = "DIR", env = "MODELCHECK_SCHEMA_DIR")]
    pub schemas: PathBuf,
    /// Model to validate against.
    #[arg(long, short = 'm', value_name = "NAME")]
    pub model: String,
    /// Reject keys the model does not declare.
    #[arg(long, env = "MODELCHECK_STRICT")]
    pub strict: bool,
}

#[derive(Args, Debug)]
pub struct ModelsArgs {
    /// Directory of `*.model.json` definitions.
    #[arg(long, value_name = "DIR", env = "MODELCHECK_SCHEMA_DIR")]
    pub schemas: PathBuf,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[derive(Args, Debug, Default)]
pub struct DoctorArgs {}
