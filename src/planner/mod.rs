//! Query Planner subsystem
//!
//! Validates raw JSON queries and produces the typed AST the executor
//! consumes.
//!
//! # Pipeline
//!
//! 1. Structural checks on WHERE, OPTIONS and TRANSFORMATIONS
//! 2. Redundant top-level keys rejected
//! 3. Dataset id resolved from qualified field references
//! 4. Full recursive parse against the dataset's kind
//!
//! Any failure is an `INSIGHT_QUERY_INVALID` error; no record is read
//! before the whole query has been validated.

mod ast;
mod errors;
mod parser;
mod references;

pub use ast::{
    ApplyRule, ApplyToken, Column, ColumnSource, Filter, Options, Order, Query, SortDirection,
    StringPattern, Transformations,
};
pub use errors::{PlannerError, PlannerErrorCode, PlannerResult, Severity};
pub use parser::QueryParser;
pub use references::{collect_dataset_ids, resolve_dataset_id};
