//! Filter evaluation
//!
//! Evaluates a WHERE tree against records, producing a membership mask
//! aligned index-for-index with the input. Comparisons are strict: numeric
//! operators only see numeric fields, IS only sees string fields, and there
//! is no coercion.

use serde_json::Value;

use crate::catalog::{DatasetKind, Field};
use crate::dataset::Record;
use crate::planner::{Filter, PlannerResult, QueryParser};

/// Evaluates filters against records
pub struct FilterEvaluator;

impl FilterEvaluator {
    /// Validates a raw WHERE body and evaluates it.
    ///
    /// `{}` matches every record. The caller's records are never modified.
    pub fn evaluate(
        dataset_id: &str,
        kind: DatasetKind,
        where_clause: &Value,
        records: &[Record],
    ) -> PlannerResult<Vec<bool>> {
        let filter = QueryParser::new(dataset_id, kind).parse_where(where_clause)?;
        Ok(Self::mask(&filter, records))
    }

    /// Evaluates a parsed filter over every record.
    pub fn mask(filter: &Filter, records: &[Record]) -> Vec<bool> {
        match filter {
            Filter::Empty => vec![true; records.len()],
            _ => records.iter().map(|r| Self::matches(filter, r)).collect(),
        }
    }

    /// Checks if a record satisfies a filter
    pub fn matches(filter: &Filter, record: &Record) -> bool {
        match filter {
            Filter::Empty => true,
            Filter::And(filters) => filters.iter().all(|f| Self::matches(f, record)),
            Filter::Or(filters) => filters.iter().any(|f| Self::matches(f, record)),
            Filter::Gt { field, value } => Self::compare(record, *field, |n| n > *value),
            Filter::Lt { field, value } => Self::compare(record, *field, |n| n < *value),
            Filter::Eq { field, value } => Self::compare(record, *field, |n| n == *value),
            Filter::Is { field, pattern } => record
                .text(*field)
                .is_some_and(|s| pattern.matches(s)),
            Filter::Not(inner) => !Self::matches(inner, record),
        }
    }

    // Missing field = no match
    fn compare(record: &Record, field: Field, op: impl Fn(f64) -> bool) -> bool {
        record.number(field).is_some_and(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::StringPattern;
    use serde_json::json;

    fn record(dept: &str, avg: f64) -> Record {
        Record::new().with(Field::Dept, dept).with(Field::Avg, avg)
    }

    fn records() -> Vec<Record> {
        vec![
            record("cpsc", 85.0),
            record("math", 72.5),
            record("ecps", 90.0),
            record("phys", 60.0),
        ]
    }

    fn eval(where_clause: Value) -> PlannerResult<Vec<bool>> {
        FilterEvaluator::evaluate("courses", DatasetKind::Sections, &where_clause, &records())
    }

    #[test]
    fn test_empty_where_matches_all() {
        assert_eq!(eval(json!({})).unwrap(), vec![true; 4]);
    }

    #[test]
    fn test_numeric_comparisons() {
        assert_eq!(
            eval(json!({"GT": {"courses_avg": 80}})).unwrap(),
            vec![true, false, true, false]
        );
        assert_eq!(
            eval(json!({"LT": {"courses_avg": 72.5}})).unwrap(),
            vec![false, false, false, true]
        );
        assert_eq!(
            eval(json!({"EQ": {"courses_avg": 72.5}})).unwrap(),
            vec![false, true, false, false]
        );
    }

    #[test]
    fn test_is_wildcards() {
        assert_eq!(
            eval(json!({"IS": {"courses_dept": "*cps*"}})).unwrap(),
            vec![true, false, true, false]
        );
        assert_eq!(
            eval(json!({"IS": {"courses_dept": "*ps"}})).unwrap(),
            vec![false, false, true, false]
        );
        assert_eq!(
            eval(json!({"IS": {"courses_dept": "cp*"}})).unwrap(),
            vec![true, false, false, false]
        );
        assert_eq!(
            eval(json!({"IS": {"courses_dept": "**"}})).unwrap(),
            vec![true; 4]
        );
        assert_eq!(
            eval(json!({"IS": {"courses_dept": "math"}})).unwrap(),
            vec![false, true, false, false]
        );
    }

    #[test]
    fn test_interior_wildcard_fails() {
        assert!(eval(json!({"IS": {"courses_dept": "c*s"}})).is_err());
    }

    #[test]
    fn test_logic() {
        assert_eq!(
            eval(json!({"AND": [{"GT": {"courses_avg": 70}}, {"IS": {"courses_dept": "*c*"}}]}))
                .unwrap(),
            vec![true, false, true, false]
        );
        assert_eq!(
            eval(json!({"OR": [{"LT": {"courses_avg": 70}}, {"IS": {"courses_dept": "math"}}]}))
                .unwrap(),
            vec![false, true, false, true]
        );
    }

    #[test]
    fn test_double_negation_is_identity() {
        let f = json!({"GT": {"courses_avg": 80}});
        let nn = json!({"NOT": {"NOT": f.clone()}});
        assert_eq!(eval(nn).unwrap(), eval(f).unwrap());
    }

    #[test]
    fn test_singleton_logic_is_identity() {
        let f = json!({"IS": {"courses_dept": "*s"}});
        let base = eval(f.clone()).unwrap();
        assert_eq!(eval(json!({"AND": [f.clone()]})).unwrap(), base);
        assert_eq!(eval(json!({"OR": [f]})).unwrap(), base);
    }

    #[test]
    fn test_mask_length_matches_input() {
        let filter = Filter::negate(Filter::is(Field::Dept, StringPattern::Any));
        assert_eq!(FilterEvaluator::mask(&filter, &records()).len(), 4);
        assert!(FilterEvaluator::mask(&filter, &[]).is_empty());
    }

    #[test]
    fn test_missing_field_no_match() {
        let r = Record::new().with(Field::Dept, "cpsc");
        assert!(!FilterEvaluator::matches(&Filter::gt(Field::Avg, 0.0), &r));
    }

    #[test]
    fn test_invalid_structure_rejected() {
        assert!(eval(json!([])).is_err());
        assert!(eval(json!({"AND": []})).is_err());
        assert!(eval(json!({"GT": {"courses_avg": 1}, "LT": {"courses_avg": 2}})).is_err());
        assert!(eval(json!({"GT": {"rooms_seats": 1}})).is_err());
    }
}
