use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use super::commands::{
    filters::FiltersArgs, metadata::MetadataArgs, query::QueryArgs, report::ReportArgs,
    schema::SchemaArgs,
};

#[derive(Debug, Parser)]
#[command(
    name = "casestats",
    version,
    about = "Statistics and aggregation over victim-support case records"
)]
pub struct Cli {
    #[command(flatten)]
    pub runtime: RuntimeArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Args)]
pub struct RuntimeArgs {
    #[arg(long, global = true, value_name = "PATH")]
    pub home_dir: Option<PathBuf>,

    #[arg(long, global = true, value_name = "PATH")]
    pub cwd: Option<PathBuf>,

    /// Case store to read; defaults to `~/.casestats/casestats.sqlite`.
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Filterable, groupable and summable fields per record type.
    Metadata(MetadataArgs),
    /// Filters and section layout of the fixed report.
    Filters(FiltersArgs),
    /// Ad-hoc aggregate over one record type.
    Query(QueryArgs),
    /// Fixed KPI report for a period.
    Report(ReportArgs),
    /// JSON schema of a request body.
    Schema(SchemaArgs),
}
