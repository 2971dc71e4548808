use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Error, Result};
use clap::Args;
use serde_json::json;

use super::{encode_data, parse_key_value, print_envelope, store_unavailable};
use crate::config::RuntimePaths;
use crate::models::{QueryEnvelope, QueryEnvelopeCommandFailure};
use crate::report::{FacetValue, ReportEngine, ReportError, ReportRequest, ReportRequestError};
use crate::telemetry::TracingTelemetry;

const COMMAND: &str = "report";

#[derive(Debug, Clone, Args)]
pub struct ReportArgs {
    /// Whole request as a JSON object, as posted by the statistics page.
    #[arg(
        long,
        value_name = "JSON",
        conflicts_with_all = ["from", "to", "facets", "hide"]
    )]
    pub request: Option<String>,

    #[arg(long, value_name = "YYYY-MM-DD")]
    pub from: Option<String>,

    #[arg(long, value_name = "YYYY-MM-DD")]
    pub to: Option<String>,

    /// Facet restriction; repeat a name to allow several codes.
    #[arg(long = "facet", value_name = "NAME=CODE", value_parser = parse_key_value)]
    pub facets: Vec<(String, String)>,

    /// Section or subsection key to leave out of the layout.
    #[arg(long = "hide", value_name = "KEY")]
    pub hide: Vec<String>,

    /// Also write the report as pretty JSON to this file.
    #[arg(long, value_name = "PATH")]
    pub snapshot: Option<PathBuf>,
}

pub fn run(args: &ReportArgs, runtime_paths: &RuntimePaths) -> Result<()> {
    let request = build_request(args)?;
    request.resolve().map_err(|error| rejected(&error))?;

    let connection = crate::sqlite::open_read_only(&runtime_paths.db_path)
        .map_err(|error| store_unavailable(COMMAND, &runtime_paths.db_path, &error))?;

    let started = Instant::now();
    let engine = ReportEngine::new(Arc::new(TracingTelemetry));
    let report = engine
        .run(&connection, &request)
        .map_err(|error| match error {
            ReportError::Request(error) => rejected(&error),
            ReportError::Store(error) => Error::new(QueryEnvelopeCommandFailure::runtime(
                QueryEnvelope::error(COMMAND, "report_failed", "report computation failed")
                    .with_error_details(json!({ "cause": format!("{error:#}") })),
            )),
        })?;
    let duration_ms = started.elapsed().as_millis() as u64;

    let mut envelope = QueryEnvelope::ok(COMMAND, encode_data(COMMAND, &report)?)
        .with_meta("kpi_count", json!(report.data.len()))
        .with_meta("section_count", json!(report.structure.sections.len()))
        .with_meta("duration_ms", json!(duration_ms));

    if let Some(path) = &args.snapshot {
        let path = runtime_paths.cwd.join(path);
        let encoded =
            serde_json::to_string_pretty(&report).context("failed to encode report snapshot")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create snapshot directory: {}", parent.display())
            })?;
        }
        std::fs::write(&path, format!("{encoded}\n"))
            .with_context(|| format!("failed to write report snapshot: {}", path.display()))?;
        tracing::info!(path = %path.display(), "report snapshot written");
        envelope = envelope.with_meta("snapshot_path", json!(path.display().to_string()));
    }

    print_envelope(&envelope)
}

/// Assembles the request from `--request` or the individual flags.
pub fn build_request(args: &ReportArgs) -> Result<ReportRequest> {
    if let Some(raw) = &args.request {
        return serde_json::from_str(raw).map_err(|error| {
            Error::new(QueryEnvelopeCommandFailure::validation(
                QueryEnvelope::error(COMMAND, "invalid_request", "request body is not valid")
                    .with_error_details(json!({ "cause": error.to_string() })),
            ))
        });
    }

    let mut facets: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for (name, code) in &args.facets {
        facets.entry(name.as_str()).or_default().push(code.clone());
    }

    let mut request =
        ReportRequest::default().with_period(args.from.as_deref(), args.to.as_deref());
    for (name, codes) in facets {
        request = request.with_facet(name, FacetValue::Many(codes));
    }
    for key in &args.hide {
        request = request.with_visibility(key.clone(), false);
    }
    Ok(request)
}

fn rejected(error: &ReportRequestError) -> Error {
    Error::new(QueryEnvelopeCommandFailure::validation(
        QueryEnvelope::error(COMMAND, error.code(), error.to_string())
            .with_error_details(json!({ "field": error.field() })),
    ))
}
