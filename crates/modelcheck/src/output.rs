use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use modelcheck_core::{Failure, Record, Schema, ValidationError};
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ValidOutput<'a> {
    model: &'a str,
    valid: bool,
    record: Value,
}

#[derive(Serialize)]
struct InvalidOutput<'a> {
    model: &'a str,
    valid: bool,
    error_count: usize,
    errors: &'a [Failure],
}

#[derive(Serialize)]
struct FieldOutput<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    field_type: String,
    optional: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    default: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    validators: Vec<&'a str>,
}

#[derive(Serialize)]
struct ModelOutput<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    strict: bool,
    fields: Vec<FieldOutput<'a>>,
}

pub fn print_record(record: &Record, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = ValidOutput {
                model: record.schema_name(),
                valid: true,
                record: record.to_json(),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = new_table(vec!["FIELD", "VALUE"]);
            for (name, value) in record.fields() {
                table.add_row(vec![name.to_string(), value.to_string()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("{} {record}", record.schema_name());
        }
        OutputFormat::Raw => {
            print_json(&record.to_json());
        }
    }
}

pub fn print_failures(err: &ValidationError, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = InvalidOutput {
                model: err.schema_name(),
                valid: false,
                error_count: err.len(),
                errors: err.failures(),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = new_table(vec!["PATH", "REASON", "MESSAGE"]);
            for failure in err.failures() {
                table.add_row(vec![
                    failure.path.clone(),
                    failure.reason.to_string(),
                    failure.message.clone(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("{err}");
        }
        OutputFormat::Raw => {
            print_json(&err.field_messages());
        }
    }
}

pub fn print_models(schemas: &[&Schema], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out: Vec<ModelOutput<'_>> = schemas.iter().map(|s| model_output(s)).collect();
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = new_table(vec!["MODEL", "FIELD", "TYPE", "OPTIONAL", "DEFAULT"]);
            for schema in schemas {
                for field in schema.fields() {
                    table.add_row(vec![
                        schema.name().to_string(),
                        field.name().to_string(),
                        field.field_type().to_string(),
                        field.is_optional().to_string(),
                        field
                            .default_value()
                            .map(ToString::to_string)
                            .unwrap_or_default(),
                    ]);
                }
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for schema in schemas {
                let strict = if schema.is_strict() { " (strict)" } else { "" };
                println!("{}{strict}", schema.name());
                for field in schema.fields() {
                    let marker = if field.is_optional() { "?" } else { "" };
                    println!("  {}{marker}: {}", field.name(), field.field_type());
                }
            }
        }
        OutputFormat::Raw => {
            for schema in schemas {
                println!("{}", schema.name());
            }
        }
    }
}

fn model_output(schema: &Schema) -> ModelOutput<'_> {
    ModelOutput {
        name: schema.name(),
        description: schema.description(),
        strict: schema.is_strict(),
        fields: schema
            .fields()
            .iter()
            .map(|field| FieldOutput {
                name: field.name(),
                field_type: field.field_type().to_string(),
                optional: field.is_optional(),
                default: field.default_value().map(modelcheck_core::to_plain_value),
                validators: field.validators().iter().map(|hook| hook.name()).collect(),
            })
            .collect(),
    }
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}
