//! CLI module for campusquery
//!
//! Provides command-line interface for:
//! - query: One-shot query execution over the configured datasets
//! - datasets: List the configured datasets

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{
    datasets, execute_query, load_dataset, load_store, query, run, run_command, Config,
    DatasetEntry,
};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{
    error_response, ok_response, parse_request, read_request, write_response, Response,
};
