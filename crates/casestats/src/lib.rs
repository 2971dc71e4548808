#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod models;
pub mod query;
pub mod registry;
pub mod report;
pub mod sqlite;
pub mod telemetry;
pub mod utils;

pub use cli::app::{Cli, Command};
