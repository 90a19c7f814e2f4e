//! campusquery - a deterministic query engine for course sections and
//! campus rooms
//!
//! Queries are JSON documents with a WHERE filter tree, OPTIONS selecting
//! and ordering columns, and optional GROUP/APPLY transformations. Every
//! query is fully validated before any record is read.

pub mod catalog;
pub mod cli;
pub mod dataset;
pub mod executor;
pub mod observability;
pub mod planner;

pub use catalog::{DatasetKind, Field};
pub use dataset::{Dataset, DatasetStore, FieldValue, Record};
pub use executor::{ExecutionResult, ExecutorError, QueryEngine, ResultRow, MAX_QUERY_RESULTS};
