//! Query Executor subsystem
//!
//! Runs validated queries against immutable dataset snapshots and produces
//! deterministic results.
//!
//! # Execution Flow (strict order)
//!
//! 1. Validate the whole query (planner)
//! 2. Filter records by WHERE
//! 3. Without TRANSFORMATIONS: enforce the row cap on the matched records,
//!    then project COLUMNS and sort by ORDER
//! 4. With TRANSFORMATIONS: group and aggregate, project COLUMNS, sort by
//!    ORDER, then enforce the row cap on the group rows
//!
//! # Guarantees
//!
//! - Same query + same dataset = same rows in the same order
//! - Records are only read, never modified
//! - Errors leaving this module carry exactly one of two codes

mod errors;
mod executor;
mod filters;
mod projector;
mod result;
mod sorter;
mod transform;

pub use errors::{ExecutorError, ExecutorErrorCode, ExecutorResult};
pub use executor::{DatasetSource, QueryEngine, MAX_QUERY_RESULTS};
pub use filters::FilterEvaluator;
pub use projector::ResultProjector;
pub use result::{ExecutionResult, ResultRow};
pub use sorter::ResultSorter;
pub use transform::{Aggregates, Group, TransformationEngine};
