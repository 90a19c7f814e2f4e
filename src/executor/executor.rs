//! Query orchestrator
//!
//! Execution flow (strict order):
//! 1. Structural checks on the raw query
//! 2. Resolve the single referenced dataset id
//! 3. Load the dataset snapshot
//! 4. Full validating parse against the dataset's kind
//! 5. Filter records
//! 6. Untransformed: enforce the row cap on the filtered count, project
//! 7. Transformed: group, apply, project, enforce the row cap on the rows
//! 8. Return ordered results
//!
//! Nothing is evaluated until step 4 has accepted the whole query.

use std::sync::Arc;

use serde_json::Value;

use crate::dataset::{Dataset, Record};
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::planner::{resolve_dataset_id, Query, QueryParser};

use super::errors::{ExecutorError, ExecutorResult};
use super::filters::FilterEvaluator;
use super::projector::ResultProjector;
use super::result::ExecutionResult;
use super::transform::TransformationEngine;

/// Maximum number of rows a query may return
pub const MAX_QUERY_RESULTS: usize = 5000;

/// Trait for looking up loaded datasets by id
pub trait DatasetSource {
    /// Returns an immutable snapshot of the dataset, if loaded
    fn dataset(&self, id: &str) -> Option<Arc<Dataset>>;
}

/// Query engine that runs raw JSON queries against a dataset source
pub struct QueryEngine<'a, S: DatasetSource> {
    source: &'a S,
    metrics: Option<&'a MetricsRegistry>,
}

impl<'a, S: DatasetSource> QueryEngine<'a, S> {
    /// Creates a new engine
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            metrics: None,
        }
    }

    /// Records counters into `metrics` for every query
    pub fn with_metrics(mut self, metrics: &'a MetricsRegistry) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Runs a query and returns its rows.
    ///
    /// Same query + same dataset = same rows, in the same order.
    pub fn perform_query(&self, query: &Value) -> ExecutorResult<ExecutionResult> {
        log_event_with_fields(Event::QueryStart, &[]);

        let outcome = self.run(query);
        match &outcome {
            Ok(result) => {
                let rows = result.len().to_string();
                let scanned = result.scanned_count.to_string();
                log_event_with_fields(
                    Event::QueryComplete,
                    &[("rows", &rows), ("scanned", &scanned)],
                );
                if let Some(metrics) = self.metrics {
                    metrics.increment_queries_executed();
                    metrics.add_rows_returned(result.len() as u64);
                    metrics.add_records_scanned(result.scanned_count as u64);
                }
            }
            Err(err) if err.is_result_too_large() => {
                log_event_with_fields(Event::QueryTooLarge, &[("message", err.message())]);
                if let Some(metrics) = self.metrics {
                    metrics.increment_queries_too_large();
                }
            }
            Err(err) => {
                log_event_with_fields(Event::QueryRejected, &[("message", err.message())]);
                if let Some(metrics) = self.metrics {
                    metrics.increment_queries_rejected();
                }
            }
        }
        outcome
    }

    fn run(&self, raw: &Value) -> ExecutorResult<ExecutionResult> {
        // Steps 1-2: structure before ids, so a malformed query never names a dataset
        QueryParser::check_structure(raw)?;
        let dataset_id = resolve_dataset_id(raw)?;

        // Step 3
        let dataset = self
            .source
            .dataset(&dataset_id)
            .ok_or_else(|| ExecutorError::unknown_dataset(&dataset_id))?;

        // Step 4
        let query = QueryParser::new(&dataset_id, dataset.kind()).parse(raw)?;

        // Step 5
        let records = dataset.records();
        let mask = FilterEvaluator::mask(&query.filter, records);
        let matched: Vec<&Record> = records
            .iter()
            .zip(&mask)
            .filter_map(|(record, keep)| keep.then_some(record))
            .collect();

        let mut result = ExecutionResult {
            scanned_count: records.len(),
            matched_count: matched.len(),
            ..ExecutionResult::default()
        };

        match &query.transformations {
            None => {
                // Step 6
                Self::check_cap(matched.len())?;
                result.rows = ResultProjector::project_records(&query.options, &matched);
            }
            Some(transformations) => {
                // Step 7
                let groups = TransformationEngine::transform(transformations, matched);
                let rows = ResultProjector::project_groups(&query.options, &groups);
                Self::check_cap(rows.len())?;
                result.rows = rows;
                result.transformed = true;
            }
        }

        Ok(result)
    }

    /// Validates a raw query without touching any record.
    pub fn validate(&self, raw: &Value) -> ExecutorResult<Query> {
        QueryParser::check_structure(raw)?;
        let dataset_id = resolve_dataset_id(raw)?;
        let dataset = self
            .source
            .dataset(&dataset_id)
            .ok_or_else(|| ExecutorError::unknown_dataset(&dataset_id))?;
        Ok(QueryParser::new(&dataset_id, dataset.kind()).parse(raw)?)
    }

    fn check_cap(rows: usize) -> ExecutorResult<()> {
        if rows > MAX_QUERY_RESULTS {
            return Err(ExecutorError::result_too_large(rows, MAX_QUERY_RESULTS));
        }
        Ok(())
    }
}
