use anyhow::Result;
use clap::{Args, ValueEnum};
use serde_json::json;

use super::print_envelope;
use crate::models::QueryEnvelope;

const COMMAND: &str = "schema";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SchemaTarget {
    /// Ad-hoc aggregate request.
    Query,
    /// Fixed report request.
    Report,
}

impl SchemaTarget {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Report => "report",
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct SchemaArgs {
    #[arg(value_enum, value_name = "TARGET")]
    pub target: SchemaTarget,
}

pub fn run(args: &SchemaArgs) -> Result<()> {
    let schema = match args.target {
        SchemaTarget::Query => crate::query::json_schema(),
        SchemaTarget::Report => crate::report::request::json_schema(),
    };
    print_envelope(
        &QueryEnvelope::ok(COMMAND, schema).with_meta("target", json!(args.target.as_str())),
    )
}
