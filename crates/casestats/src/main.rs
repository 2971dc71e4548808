#![forbid(unsafe_code)]

use anyhow::Result;
use casestats::cli::app::{Cli, Command, RuntimeArgs};
use casestats::cli::commands;
use casestats::config::{DEFAULT_LOG_FILTER, LOG_ENV_VAR, RuntimePaths};
use casestats::models::{FailureKind, QueryEnvelope, QueryEnvelopeCommandFailure};
use clap::Parser;
use clap::error::ErrorKind;
use serde_json::json;
use tracing_subscriber::EnvFilter;

const EXIT_SUCCESS: i32 = 0;
const EXIT_RUNTIME_FAILURE: i32 = 1;
const EXIT_VALIDATION_FAILURE: i32 = 2;
const EXIT_USAGE_ERROR: i32 = 64;

fn main() {
    std::process::exit(run());
}

fn run() -> i32 {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => return exit_code_for_parse_error(error),
    };
    init_tracing();

    let command_name = command_name(&cli.command);
    tracing::debug!(command = command_name, "starting");

    match execute(cli) {
        Ok(()) => {
            tracing::debug!(command = command_name, exit_code = EXIT_SUCCESS, "completed");
            EXIT_SUCCESS
        }
        Err(error) => {
            let exit_code = classify_runtime_error(&error);
            tracing::error!(command = command_name, exit_code, "{error:#}");
            println!("{}", failure_envelope(command_name, &error));
            exit_code
        }
    }
}

/// Diagnostics go to stderr; stdout carries only envelopes.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Metadata(args) => commands::metadata::run(&args),
        Command::Filters(args) => commands::filters::run(&args),
        Command::Query(args) => {
            let runtime_paths = resolve_runtime_paths(&cli.runtime)?;
            commands::query::run(&args, &runtime_paths)
        }
        Command::Report(args) => {
            let runtime_paths = resolve_runtime_paths(&cli.runtime)?;
            commands::report::run(&args, &runtime_paths)
        }
        Command::Schema(args) => commands::schema::run(&args),
    }
}

fn classify_runtime_error(error: &anyhow::Error) -> i32 {
    match error
        .downcast_ref::<QueryEnvelopeCommandFailure>()
        .map(QueryEnvelopeCommandFailure::kind)
    {
        Some(FailureKind::Validation) => EXIT_VALIDATION_FAILURE,
        Some(FailureKind::Runtime) | None => EXIT_RUNTIME_FAILURE,
    }
}

fn failure_envelope(command_name: &str, error: &anyhow::Error) -> String {
    if let Some(failure) = error.downcast_ref::<QueryEnvelopeCommandFailure>() {
        return failure.to_string();
    }
    let envelope = QueryEnvelope::error(command_name, "runtime_error", "command failed")
        .with_error_details(json!({ "cause": format!("{error:#}") }));
    QueryEnvelopeCommandFailure::runtime(envelope).to_string()
}

fn exit_code_for_parse_error(error: clap::Error) -> i32 {
    match error.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let _ = error.print();
            EXIT_SUCCESS
        }
        _ => {
            let _ = error.print();
            EXIT_USAGE_ERROR
        }
    }
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Metadata(_) => "metadata",
        Command::Filters(_) => "filters",
        Command::Query(_) => "query",
        Command::Report(_) => "report",
        Command::Schema(_) => "schema",
    }
}

fn resolve_runtime_paths(args: &RuntimeArgs) -> Result<RuntimePaths> {
    RuntimePaths::from_environment(
        args.home_dir.as_deref(),
        args.cwd.as_deref(),
        args.db.as_deref(),
    )
}
