//! CLI command implementations
//!
//! Every command loads the config, loads every configured dataset into a
//! fresh store, then does its work. Nothing is persisted.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::DatasetKind;
use crate::dataset::{validate_id, Dataset, DatasetStore, Record};
use crate::executor::{QueryEngine, ResultRow};
use crate::observability::{
    log_event_with_fields, log_metrics, Event, Logger, MetricsRegistry, Severity,
};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{error_response, ok_response, read_request, write_json, write_response, Response};

/// One configured dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetEntry {
    /// Dataset id used as the field prefix in queries
    pub id: String,
    /// `sections` or `rooms`
    pub kind: String,
    /// JSON array of records; relative to the config file
    pub path: PathBuf,
}

impl DatasetEntry {
    /// Parsed dataset kind
    pub fn dataset_kind(&self) -> CliResult<DatasetKind> {
        DatasetKind::parse(&self.kind).ok_or_else(|| {
            CliError::config_error(format!(
                "Invalid kind '{}' for dataset '{}'. Must be 'sections' or 'rooms'.",
                self.kind, self.id
            ))
        })
    }
}

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Datasets to load (optional, default none)
    #[serde(default)]
    pub datasets: Vec<DatasetEntry>,

    /// Minimum log severity (optional, default "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory relative dataset paths resolve against
    #[serde(skip)]
    base_dir: PathBuf,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let mut config = Self::parse(&content)?;
        config.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

        let datasets = config.datasets.len().to_string();
        log_event_with_fields(
            Event::ConfigLoaded,
            &[("datasets", &datasets), ("path", &path.display().to_string())],
        );

        Ok(config)
    }

    /// Parse and validate configuration text. Paths resolve against the
    /// working directory.
    pub fn parse(content: &str) -> CliResult<Self> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    fn validate(&self) -> CliResult<()> {
        if Severity::parse(&self.log_level).is_none() {
            return Err(CliError::config_error(format!(
                "Invalid log_level: '{}'. Must be one of trace, info, warn, error.",
                self.log_level
            )));
        }

        let mut seen = HashSet::new();
        for entry in &self.datasets {
            validate_id(&entry.id)
                .map_err(|e| CliError::config_error(e.to_string()))?;
            if !seen.insert(entry.id.as_str()) {
                return Err(CliError::config_error(format!(
                    "Duplicate dataset id: '{}'",
                    entry.id
                )));
            }
            entry.dataset_kind()?;
        }

        Ok(())
    }

    /// Configured minimum log severity
    pub fn min_severity(&self) -> Severity {
        Severity::parse(&self.log_level).unwrap_or(Severity::Info)
    }

    /// Resolve a dataset path against the config file's directory
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Query { config } => query(&config),
        Command::Datasets { config } => datasets(&config),
    }
}

/// Execute a single query read from stdin and exit
pub fn query(config_path: &Path) -> CliResult<()> {
    let store = boot(config_path)?;
    let request = read_request()?;
    let metrics = MetricsRegistry::new();

    let response = execute_query(&store, &metrics, &request);
    log_metrics(&metrics.snapshot());
    write_json(&response)
}

/// Print the loaded datasets
pub fn datasets(config_path: &Path) -> CliResult<()> {
    let store = boot(config_path)?;
    write_response(store.list_datasets())
}

/// Runs one query and builds the response envelope.
///
/// Query failures become error responses; they never fail the command.
pub fn execute_query(
    store: &DatasetStore,
    metrics: &MetricsRegistry,
    request: &Value,
) -> Response<Vec<ResultRow>> {
    let engine = QueryEngine::new(store).with_metrics(metrics);
    match engine.perform_query(request) {
        Ok(result) => ok_response(result.into_rows()),
        Err(e) => error_response(e.code().code(), e.message()),
    }
}

/// Load config, apply its log level, and load every configured dataset.
fn boot(config_path: &Path) -> CliResult<DatasetStore> {
    let config = Config::load(config_path)?;
    Logger::set_min_severity(config.min_severity());
    load_store(&config)
}

/// Load every configured dataset into a new store
pub fn load_store(config: &Config) -> CliResult<DatasetStore> {
    let store = DatasetStore::new();
    for entry in &config.datasets {
        let kind = entry.dataset_kind()?;
        let path = config.resolve_path(&entry.path);
        store.insert(load_dataset(&entry.id, kind, &path)?)?;
    }
    Ok(store)
}

/// Read a dataset file: a JSON array of flat records.
pub fn load_dataset(id: &str, kind: DatasetKind, path: &Path) -> CliResult<Dataset> {
    let content = fs::read_to_string(path).map_err(|e| {
        CliError::io_error(format!("Failed to read dataset '{}' at {:?}: {}", id, path, e))
    })?;
    let value: Value = serde_json::from_str(&content).map_err(|e| {
        CliError::dataset_error(format!("Dataset '{}' is not valid JSON: {}", id, e))
    })?;
    let items = value.as_array().ok_or_else(|| {
        CliError::dataset_error(format!("Dataset '{}' must be a JSON array of records", id))
    })?;

    let records = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            Record::from_json(kind, item).map_err(|e| {
                CliError::dataset_error(format!("Dataset '{}' record {}: {}", id, i, e))
            })
        })
        .collect::<CliResult<Vec<_>>>()?;

    let dataset = Dataset::new(id, kind, records)?;
    log_event_with_fields(
        Event::DatasetLoaded,
        &[
            ("dataset", id),
            ("path", &path.display().to_string()),
            ("rows", &dataset.num_rows().to_string()),
        ],
    );
    Ok(dataset)
}
