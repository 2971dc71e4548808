use std::sync::Arc;
use std::time::Instant;

use anyhow::{Error, Result};
use clap::Args;
use serde_json::{Value, json};

use super::{encode_data, parse_key_value, print_envelope, store_unavailable};
use crate::config::RuntimePaths;
use crate::models::{QueryEnvelope, QueryEnvelopeCommandFailure};
use crate::query::{AggregateRequest, QueryError, QueryExecutor, QueryValidationError};
use crate::registry::MetadataRegistry;
use crate::sqlite::SqliteMart;
use crate::telemetry::TracingTelemetry;

const COMMAND: &str = "query";

#[derive(Debug, Clone, Args)]
pub struct QueryArgs {
    /// Whole request as a JSON object, as sent by the web layer.
    #[arg(
        long,
        value_name = "JSON",
        conflicts_with_all = ["record_type", "group_by", "aggregation", "sum_field", "filters"]
    )]
    pub request: Option<String>,

    #[arg(long, value_name = "NAME", required_unless_present = "request")]
    pub record_type: Option<String>,

    #[arg(long, value_name = "FIELD")]
    pub group_by: Option<String>,

    /// `count`, `sum`, `sum:<field>` or `sum_<field>`.
    #[arg(long, value_name = "NAME")]
    pub aggregation: Option<String>,

    #[arg(long, value_name = "FIELD")]
    pub sum_field: Option<String>,

    /// `<field>[__<lookup>]=<value>`; the value is read as JSON when it parses.
    #[arg(long = "filter", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub filters: Vec<(String, String)>,
}

pub fn run(args: &QueryArgs, runtime_paths: &RuntimePaths) -> Result<()> {
    let request = build_request(args)?;
    let executor = QueryExecutor::new(
        Arc::new(MetadataRegistry::standard()),
        Arc::new(TracingTelemetry),
    );

    executor
        .validate(&request)
        .map_err(|error| rejected(&error))?;

    let store = SqliteMart::open_read_only(&runtime_paths.db_path)
        .map_err(|error| store_unavailable(COMMAND, &runtime_paths.db_path, &error))?;

    let started = Instant::now();
    let result = executor.run(&store, &request).map_err(|error| match error {
        QueryError::Validation(error) => rejected(&error),
        QueryError::Store(error) => Error::new(QueryEnvelopeCommandFailure::runtime(
            QueryEnvelope::error(COMMAND, "query_execution_failed", "query execution failed")
                .with_error_details(json!({ "cause": format!("{error:#}") })),
        )),
    })?;
    let duration_ms = started.elapsed().as_millis() as u64;

    let envelope = QueryEnvelope::ok(COMMAND, encode_data(COMMAND, &result)?)
        .with_meta("group_count", json!(result.results.len()))
        .with_meta("duration_ms", json!(duration_ms));
    print_envelope(&envelope)
}

/// Assembles the request from `--request` or the individual flags.
pub fn build_request(args: &QueryArgs) -> Result<AggregateRequest> {
    if let Some(raw) = &args.request {
        return serde_json::from_str(raw).map_err(|error| {
            Error::new(QueryEnvelopeCommandFailure::validation(
                QueryEnvelope::error(COMMAND, "invalid_request", "request body is not valid")
                    .with_error_details(json!({ "cause": error.to_string() })),
            ))
        });
    }

    let mut request = AggregateRequest::count(args.record_type.clone().unwrap_or_default());
    request.group_by = args.group_by.clone();
    request.sum_field = args.sum_field.clone();
    if let Some(aggregation) = &args.aggregation {
        request.aggregation = aggregation.clone();
    }
    for (key, raw) in &args.filters {
        request.filters.insert(key.clone(), filter_value(raw));
    }
    Ok(request)
}

fn filter_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn rejected(error: &QueryValidationError) -> Error {
    Error::new(QueryEnvelopeCommandFailure::validation(
        QueryEnvelope::error(COMMAND, error.code(), error.to_string())
            .with_error_details(json!({ "field": error.field() })),
    ))
}
