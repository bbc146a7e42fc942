use std::io::Read;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, info};

use crate::cmd::{load_registry, ValidateArgs};
use crate::exit::{io_error, schema_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::{print_failures, print_record, OutputFormat};

pub fn run(args: ValidateArgs, format: OutputFormat) -> CliResult<i32> {
    let registry = load_registry(&args.schemas, args.strict)?;
    let schema = registry
        .schema(&args.model)
        .map_err(|err| schema_error("validate", err))?;

    let input = read_document(&args)?;
    debug!(model = %args.model, strict = args.strict, "validating document");

    match schema.validate(&input) {
        Ok(record) => {
            info!(model = %args.model, "document is valid");
            print_record(&record, format);
            Ok(SUCCESS)
        }
        Err(err) => {
            info!(model = %args.model, failures = err.len(), "document is invalid");
            print_failures(&err, format);
            Ok(DATA_INVALID)
        }
    }
}

fn read_document(args: &ValidateArgs) -> CliResult<Value> {
    let text = match (&args.json, &args.file) {
        (Some(json), _) => json.clone(),
        (None, Some(path)) if path == Path::new("-") => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|err| io_error("read stdin", err))?;
            buf
        }
        (None, Some(path)) => std::fs::read_to_string(path)
            .map_err(|err| io_error(&format!("read {}", path.display()), err))?,
        (None, None) => {
            return Err(CliError::new(
                USAGE,
                "validate requires a FILE argument or --json",
            ))
        }
    };

    serde_json::from_str(&text)
        .map_err(|err| CliError::new(DATA_INVALID, format!("input is not valid JSON: {err}")))
}
