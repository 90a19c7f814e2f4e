//! GROUP / APPLY evaluation
//!
//! Groups are formed by the tuple of values at the GROUP fields, compared
//! structurally. Groups appear in the order their key was first seen, and
//! records inside a group keep their input order. Every group has at least
//! one record.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;

use crate::catalog::{DatasetKind, Field};
use crate::dataset::{FieldValue, Record, ValueKey};
use crate::planner::{ApplyRule, ApplyToken, PlannerResult, QueryParser, Transformations};

/// A non-empty run of records sharing one group key
#[derive(Debug, Clone, PartialEq)]
pub struct Group<'r> {
    records: Vec<&'r Record>,
}

impl<'r> Group<'r> {
    pub fn records(&self) -> &[&'r Record] {
        &self.records
    }

    /// The first record, which supplies group-key values to the output row
    pub fn first(&self) -> &'r Record {
        self.records[0]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Computed apply values for one group, in rule order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregates {
    values: Vec<(String, FieldValue)>,
}

impl Aggregates {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Groups records and computes aggregates
pub struct TransformationEngine;

impl TransformationEngine {
    /// Validates raw GROUP keys and partitions records by them.
    pub fn group<'r>(
        dataset_id: &str,
        kind: DatasetKind,
        group_keys: &Value,
        records: &'r [Record],
    ) -> PlannerResult<Vec<Group<'r>>> {
        let fields = QueryParser::new(dataset_id, kind).parse_group(group_keys)?;
        Ok(Self::group_by(&fields, records))
    }

    /// Validates raw APPLY rules and evaluates them over one group.
    pub fn apply_rules(
        dataset_id: &str,
        kind: DatasetKind,
        apply: &Value,
        group: &Group<'_>,
    ) -> PlannerResult<Aggregates> {
        let rules = QueryParser::new(dataset_id, kind).parse_apply(apply)?;
        Ok(Self::apply(&rules, group))
    }

    /// Partitions records by the values at `fields`.
    pub fn group_by<'r>(fields: &[Field], records: impl IntoIterator<Item = &'r Record>) -> Vec<Group<'r>> {
        let mut positions: HashMap<Vec<Option<ValueKey>>, usize> = HashMap::new();
        let mut groups: Vec<Group<'r>> = Vec::new();

        for record in records {
            let key: Vec<Option<ValueKey>> = fields
                .iter()
                .map(|f| record.get(*f).map(FieldValue::key))
                .collect();

            match positions.get(&key) {
                Some(&index) => groups[index].records.push(record),
                None => {
                    positions.insert(key, groups.len());
                    groups.push(Group {
                        records: vec![record],
                    });
                }
            }
        }
        groups
    }

    /// Evaluates every apply rule over a group.
    pub fn apply(rules: &[ApplyRule], group: &Group<'_>) -> Aggregates {
        Aggregates {
            values: rules
                .iter()
                .map(|rule| (rule.name.clone(), Self::aggregate(rule, group.records())))
                .collect(),
        }
    }

    /// Groups records and computes aggregates for each group.
    pub fn transform<'r>(
        transformations: &Transformations,
        records: impl IntoIterator<Item = &'r Record>,
    ) -> Vec<(Group<'r>, Aggregates)> {
        Self::group_by(&transformations.group, records)
            .into_iter()
            .map(|group| {
                let aggregates = Self::apply(&transformations.apply, &group);
                (group, aggregates)
            })
            .collect()
    }

    fn aggregate(rule: &ApplyRule, records: &[&Record]) -> FieldValue {
        let numbers = || records.iter().filter_map(|r| r.number(rule.field));

        let result = match rule.token {
            ApplyToken::Max => numbers().reduce(f64::max).unwrap_or(0.0),
            ApplyToken::Min => numbers().reduce(f64::min).unwrap_or(0.0),
            ApplyToken::Sum => numbers().sum::<f64>(),
            ApplyToken::Avg => average(&numbers().collect::<Vec<_>>()),
            ApplyToken::Count => {
                let distinct: HashSet<ValueKey> = records
                    .iter()
                    .filter_map(|r| r.get(rule.field))
                    .map(FieldValue::key)
                    .collect();
                distinct.len() as f64
            }
        };
        FieldValue::Number(result)
    }
}

/// Mean of `values` rounded half-up to two decimals.
///
/// The sum is accumulated in decimal so that e.g. `0.1 + 0.2` is exact.
fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sum = decimal_sum(values)
        .and_then(|d| d.to_f64())
        .unwrap_or_else(|| values.iter().sum());
    round_two_places(sum / values.len() as f64)
}

fn decimal_sum(values: &[f64]) -> Option<Decimal> {
    values.iter().try_fold(Decimal::ZERO, |acc, v| {
        let d = Decimal::from_str(&v.to_string()).ok()?;
        acc.checked_add(d)
    })
}

fn round_two_places(x: f64) -> f64 {
    Decimal::from_f64_retain(x)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or_else(|| (x * 100.0).round() / 100.0)
}
