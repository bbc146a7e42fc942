mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "modelcheck", version, about = "Validate JSON documents against declared models")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_validate_subcommand() {
        let cli = Cli::try_parse_from([
            "modelcheck",
            "validate",
            "user.json",
            "--schemas",
            "/tmp/models",
            "--model",
            "User",
            "--strict",
        ])
        .expect("validate args should parse");

        match cli.command {
            Command::Validate(args) => {
                assert_eq!(args.model, "User");
                assert!(args.strict);
                assert!(args.json.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_file_and_inline_json_together() {
        let err = Cli::try_parse_from([
            "modelcheck",
            "validate",
            "user.json",
            "--json",
            "{\"id\":1}",
            "--schemas",
            "/tmp/models",
            "--model",
            "User",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn validate_requires_an_input() {
        let err = Cli::try_parse_from([
            "modelcheck",
            "validate",
            "--schemas",
            "/tmp/models",
            "--model",
            "User",
        ])
        .expect_err("missing input should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn parses_models_subcommand() {
        let cli = Cli::try_parse_from(["modelcheck", "models", "--schemas", "/tmp/models"])
            .expect("models args should parse");
        assert!(matches!(cli.command, Command::Models(_)));
    }
}
