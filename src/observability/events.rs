//! Observable events
//!
//! Events are explicit and typed.

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration loaded
    ConfigLoaded,

    // Datasets
    /// Dataset file read from disk
    DatasetLoaded,
    /// Dataset added to the store
    DatasetAdded,
    /// Dataset removed from the store
    DatasetRemoved,

    // Query
    /// Query received
    QueryStart,
    /// Query produced a result
    QueryComplete,
    /// Query failed validation
    QueryRejected,
    /// Query result exceeded the row cap
    QueryTooLarge,

    // Metrics
    /// Counter snapshot at command exit
    MetricsReport,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::DatasetLoaded => "DATASET_LOADED",
            Event::DatasetAdded => "DATASET_ADDED",
            Event::DatasetRemoved => "DATASET_REMOVED",

            Event::QueryStart => "QUERY_BEGIN",
            Event::QueryComplete => "QUERY_COMPLETE",
            Event::QueryRejected => "QUERY_REJECTED",
            Event::QueryTooLarge => "QUERY_RESULT_TOO_LARGE",

            Event::MetricsReport => "METRICS_REPORT",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::QueryStart => Severity::Trace,
            Event::QueryRejected | Event::QueryTooLarge => Severity::Warn,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
