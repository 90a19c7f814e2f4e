//! CLI argument definitions using clap
//!
//! Commands:
//! - campusquery query --config <path>
//! - campusquery datasets --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// campusquery - query engine for course section and campus room datasets
#[derive(Parser, Debug)]
#[command(name = "campusquery")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read one query from stdin, run it, and exit
    Query {
        /// Path to configuration file
        #[arg(long, default_value = "./campusquery.json")]
        config: PathBuf,
    },

    /// List the configured datasets
    Datasets {
        /// Path to configuration file
        #[arg(long, default_value = "./campusquery.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
