//! Column projection
//!
//! Builds output rows from records or groups, restricted to COLUMNS and in
//! COLUMNS order, then applies ORDER.

use serde_json::Value;

use super::result::ResultRow;
use super::sorter::ResultSorter;
use super::transform::{Aggregates, Group};
use crate::catalog::DatasetKind;
use crate::dataset::Record;
use crate::planner::{ColumnSource, Options, PlannerResult, QueryParser};

/// Projects records and groups into result rows
pub struct ResultProjector;

impl ResultProjector {
    /// Validates a raw OPTIONS body for an untransformed query and projects
    /// the records through it.
    pub fn project(
        dataset_id: &str,
        kind: DatasetKind,
        options: &Value,
        records: &[Record],
    ) -> PlannerResult<Vec<ResultRow>> {
        let options = QueryParser::new(dataset_id, kind).parse_options(options, None)?;
        let records: Vec<&Record> = records.iter().collect();
        Ok(Self::project_records(&options, &records))
    }

    /// One row per record, then sorted.
    pub fn project_records(options: &Options, records: &[&Record]) -> Vec<ResultRow> {
        let mut rows: Vec<ResultRow> = records
            .iter()
            .map(|record| Self::record_row(options, record, None))
            .collect();
        Self::order(options, &mut rows);
        rows
    }

    /// One row per group, then sorted. Group-key values come from the
    /// group's first record.
    pub fn project_groups(options: &Options, groups: &[(Group<'_>, Aggregates)]) -> Vec<ResultRow> {
        let mut rows: Vec<ResultRow> = groups
            .iter()
            .map(|(group, aggregates)| Self::record_row(options, group.first(), Some(aggregates)))
            .collect();
        Self::order(options, &mut rows);
        rows
    }

    fn record_row(options: &Options, record: &Record, aggregates: Option<&Aggregates>) -> ResultRow {
        let mut row = ResultRow::new();
        for column in &options.columns {
            let value = match column.source {
                ColumnSource::Field(field) => record.get(field),
                ColumnSource::Apply => aggregates.and_then(|a| a.get(&column.name)),
            };
            if let Some(value) = value {
                row.push(column.name.clone(), value.clone());
            }
        }
        row
    }

    fn order(options: &Options, rows: &mut [ResultRow]) {
        if let Some(order) = &options.order {
            ResultSorter::sort(rows, order);
        }
    }
}
