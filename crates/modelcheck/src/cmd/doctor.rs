use std::path::PathBuf;

use modelcheck_core::{hook, FieldSpec, FieldType, ReasonCode, SchemaRegistry};
use serde::Serialize;
use serde_json::json;

use crate::cmd::DoctorArgs;
use crate::exit::{CliResult, HEALTH_CHECK_FAILED, SUCCESS};
use crate::output::OutputFormat;

#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Pass,
    Fail,
    Info,
    Skip,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    name: String,
    status: CheckStatus,
    detail: String,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DoctorOutput {
    checks: Vec<CheckResult>,
    overall: &'static str,
}

pub fn run(_args: DoctorArgs, format: OutputFormat) -> CliResult<i32> {
    let checks = vec![
        self_test_check(),
        compiled_features_check(),
        schema_dir_check(),
    ];

    let has_fail = checks.iter().any(|c| matches!(c.status, CheckStatus::Fail));
    let overall = if has_fail { "fail" } else { "pass" };

    let output = DoctorOutput { checks, overall };
    print_doctor(&output, format);

    if has_fail {
        Ok(HEALTH_CHECK_FAILED)
    } else {
        Ok(SUCCESS)
    }
}

fn print_doctor(output: &DoctorOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(output).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("modelcheck doctor\n");
            for c in &output.checks {
                println!(
                    "  [{:>4}] {:<18} {}",
                    status_text(c.status),
                    c.name,
                    c.detail
                );
            }
            if output.overall == "pass" {
                println!("\n  Result: all checks passed");
            } else {
                println!("\n  Result: one or more checks failed");
            }
        }
        OutputFormat::Raw => {
            println!("{}", output.overall);
        }
    }
}

fn status_text(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Pass => "PASS",
        CheckStatus::Fail => "FAIL",
        CheckStatus::Info => "INFO",
        CheckStatus::Skip => "SKIP",
    }
}

/// Validate a known-bad document and confirm every failure is reported.
fn self_test_check() -> CheckResult {
    let mut registry = SchemaRegistry::new();
    let defined = registry
        .define(
            "Probe",
            vec![
                FieldSpec::required("id", FieldType::Integer),
                FieldSpec::required("name", FieldType::String).with_validator(hook::min_length(2)),
            ],
        )
        .map_err(|err| err.to_string());

    let schema = match defined {
        Ok(schema) => schema,
        Err(err) => return CheckResult::new("self_test", CheckStatus::Fail, err),
    };

    match schema.validate(&json!({"id": "x", "name": "A"})) {
        Err(err)
            if err.len() == 2
                && err.failures()[0].reason == ReasonCode::TypeMismatch
                && err.failures()[1].reason == ReasonCode::CustomValidationFailed =>
        {
            CheckResult::new("self_test", CheckStatus::Pass, "validator reports all failures")
        }
        other => CheckResult::new(
            "self_test",
            CheckStatus::Fail,
            format!("unexpected probe outcome: {other:?}"),
        ),
    }
}

fn compiled_features_check() -> CheckResult {
    let mut features = Vec::new();
    if cfg!(feature = "cli") {
        features.push("cli");
    }
    CheckResult::new("compiled_features", CheckStatus::Info, features.join(", "))
}

fn schema_dir_check() -> CheckResult {
    let path = match std::env::var("MODELCHECK_SCHEMA_DIR") {
        Ok(value) => PathBuf::from(value),
        Err(_) => {
            return CheckResult::new(
                "schema_dir",
                CheckStatus::Skip,
                "MODELCHECK_SCHEMA_DIR not set",
            )
        }
    };

    if !path.exists() {
        return CheckResult::new(
            "schema_dir",
            CheckStatus::Fail,
            format!("{} does not exist", path.display()),
        );
    }

    if !path.is_dir() {
        return CheckResult::new(
            "schema_dir",
            CheckStatus::Fail,
            format!("{} is not a directory", path.display()),
        );
    }

    match SchemaRegistry::from_directory(&path) {
        Ok(registry) => CheckResult::new(
            "schema_dir",
            CheckStatus::Pass,
            format!("{} loaded {} model(s)", path.display(), registry.len()),
        ),
        Err(err) => CheckResult::new(
            "schema_dir",
            CheckStatus::Fail,
            format!("{} failed to load: {err}", path.display()),
        ),
    }
}
