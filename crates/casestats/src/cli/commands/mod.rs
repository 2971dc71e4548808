pub mod filters;
pub mod metadata;
pub mod query;
pub mod report;
pub mod schema;

use anyhow::{Error, Result};
use serde::Serialize;
use serde_json::{Value, json};

use crate::models::{QueryEnvelope, QueryEnvelopeCommandFailure};

/// Writes one envelope as a single JSON line on stdout.
pub(crate) fn print_envelope(envelope: &QueryEnvelope) -> Result<()> {
    let encoded = serde_json::to_string(envelope).map_err(|error| {
        Error::new(QueryEnvelopeCommandFailure::runtime(
            QueryEnvelope::error(
                envelope.command.as_str(),
                "response_encode_failed",
                "failed to encode response",
            )
            .with_error_details(json!({ "cause": format!("{error:#}") })),
        ))
    })?;
    println!("{encoded}");
    Ok(())
}

pub(crate) fn encode_data<T: Serialize>(command: &str, data: &T) -> Result<Value> {
    serde_json::to_value(data).map_err(|error| {
        Error::new(QueryEnvelopeCommandFailure::runtime(
            QueryEnvelope::error(command, "response_encode_failed", "failed to encode response")
                .with_error_details(json!({ "cause": format!("{error:#}") })),
        ))
    })
}

/// `--flag key=value` parser shared by filter and facet options.
pub fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in `{raw}`"));
    }
    Ok((key.to_string(), value.to_string()))
}

pub(crate) fn store_unavailable(command: &str, path: &std::path::Path, error: &Error) -> Error {
    Error::new(QueryEnvelopeCommandFailure::runtime(
        QueryEnvelope::error(command, "store_unavailable", "unable to open case store")
            .with_error_details(json!({
                "db_path": path.display().to_string(),
                "cause": format!("{error:#}")
            })),
    ))
}
