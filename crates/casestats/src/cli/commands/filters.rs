use anyhow::Result;
use clap::Args;
use serde_json::json;

use super::{encode_data, print_envelope};
use crate::models::QueryEnvelope;
use crate::report::{ReportStructure, filter_catalog};

const COMMAND: &str = "filters";

#[derive(Debug, Clone, Args)]
pub struct FiltersArgs {
    /// Omit the section layout and list only the filters.
    #[arg(long, default_value_t = false)]
    pub filters_only: bool,
}

pub fn run(args: &FiltersArgs) -> Result<()> {
    let filters = filter_catalog();
    let filter_count = filters.len();
    let data = if args.filters_only {
        json!({ "filters": encode_data(COMMAND, &filters)? })
    } else {
        json!({
            "filters": encode_data(COMMAND, &filters)?,
            "structure": encode_data(COMMAND, &ReportStructure::full())?,
        })
    };

    print_envelope(&QueryEnvelope::ok(COMMAND, data).with_meta("filter_count", json!(filter_count)))
}
