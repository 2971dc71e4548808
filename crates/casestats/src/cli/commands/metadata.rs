use anyhow::Result;
use clap::Args;
use serde_json::json;

use super::{encode_data, print_envelope};
use crate::models::{FIELD_TABLE_VERSION, QueryEnvelope, RecordType};
use crate::registry::MetadataRegistry;
use crate::telemetry::TracingTelemetry;

const COMMAND: &str = "metadata";

#[derive(Debug, Clone, Args)]
pub struct MetadataArgs {
    /// Limit the output to these record types; repeatable.
    #[arg(long = "record-type", value_name = "NAME")]
    pub record_types: Vec<String>,
}

pub fn run(args: &MetadataArgs) -> Result<()> {
    let registry = if args.record_types.is_empty() {
        MetadataRegistry::standard()
    } else {
        MetadataRegistry::for_record_types(
            args.record_types.iter().map(String::as_str),
            &TracingTelemetry,
        )
    };

    let mut envelope = QueryEnvelope::ok(COMMAND, encode_data(COMMAND, &registry)?)
        .with_meta("field_table_version", json!(FIELD_TABLE_VERSION))
        .with_meta("record_type_count", json!(registry.len()));

    let unknown: Vec<&str> = args
        .record_types
        .iter()
        .map(String::as_str)
        .filter(|name| RecordType::from_name(name).is_none())
        .collect();
    if !unknown.is_empty() {
        envelope = envelope
            .with_warning(
                "unknown_record_type",
                "some record types are not available for statistics",
            )
            .with_warning_details(json!({ "record_types": unknown }));
    }

    print_envelope(&envelope)
}
