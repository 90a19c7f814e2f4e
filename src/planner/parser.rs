//! Query validation and parsing
//!
//! Turns a raw JSON query into a typed [`Query`]. Validation is strict and
//! fails fast: the first problem found is reported and nothing else is
//! examined.
//!
//! Parsing happens in two phases because field references can only be
//! resolved once the dataset is known:
//!
//! 1. [`QueryParser::check_structure`]: shape of the top-level object,
//!    WHERE, OPTIONS and TRANSFORMATIONS, and no redundant keys
//! 2. [`QueryParser::parse`]: full recursive parse against a dataset id
//!    and kind

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::catalog::{DatasetKind, Field, FieldCatalog, FieldRequirement};

use super::ast::{
    ApplyRule, ApplyToken, Column, ColumnSource, Filter, Options, Order, Query, SortDirection,
    StringPattern, Transformations,
};
use super::errors::{PlannerError, PlannerResult};

pub const KEY_WHERE: &str = "WHERE";
pub const KEY_OPTIONS: &str = "OPTIONS";
pub const KEY_TRANSFORMATIONS: &str = "TRANSFORMATIONS";
pub const KEY_COLUMNS: &str = "COLUMNS";
pub const KEY_ORDER: &str = "ORDER";
pub const KEY_GROUP: &str = "GROUP";
pub const KEY_APPLY: &str = "APPLY";

const FILTER_KEYS: [&str; 7] = ["AND", "OR", "GT", "LT", "EQ", "IS", "NOT"];

/// Parses raw queries for one dataset
#[derive(Debug, Clone)]
pub struct QueryParser<'a> {
    dataset_id: &'a str,
    kind: DatasetKind,
}

impl<'a> QueryParser<'a> {
    pub fn new(dataset_id: &'a str, kind: DatasetKind) -> Self {
        Self { dataset_id, kind }
    }

    /// Validates the query's outer shape without resolving any field.
    pub fn check_structure(query: &Value) -> PlannerResult<&Map<String, Value>> {
        let object = match query {
            Value::Object(object) => object,
            Value::Null => return Err(PlannerError::query_invalid("Query is null")),
            other => {
                return Err(PlannerError::query_invalid(format!(
                    "Query must be an object, found {}",
                    json_type(other)
                )))
            }
        };

        let where_clause = object
            .get(KEY_WHERE)
            .and_then(Value::as_object)
            .ok_or_else(|| PlannerError::query_invalid("Missing or invalid WHERE in query"))?;
        if !where_clause.is_empty() && !is_filter_node(&object[KEY_WHERE]) {
            return Err(PlannerError::query_invalid("Missing or invalid WHERE in query"));
        }

        let options = object
            .get(KEY_OPTIONS)
            .and_then(Value::as_object)
            .ok_or_else(|| PlannerError::query_invalid("Missing or invalid OPTIONS in query"))?;
        let options_ok = options.contains_key(KEY_COLUMNS)
            && options.keys().all(|k| k == KEY_COLUMNS || k == KEY_ORDER);
        if !options_ok {
            return Err(PlannerError::query_invalid("Missing or invalid OPTIONS in query"));
        }

        if let Some(transformations) = object.get(KEY_TRANSFORMATIONS) {
            let ok = transformations.as_object().is_some_and(|t| {
                t.len() == 2 && t.contains_key(KEY_GROUP) && t.contains_key(KEY_APPLY)
            });
            if !ok {
                return Err(PlannerError::query_invalid("Invalid TRANSFORMATIONS in query"));
            }
        }

        if let Some(extra) = object
            .keys()
            .find(|k| ![KEY_WHERE, KEY_OPTIONS, KEY_TRANSFORMATIONS].contains(&k.as_str()))
        {
            return Err(PlannerError::query_invalid(format!(
                "Redundant key '{}' in query",
                extra
            )));
        }

        Ok(object)
    }

    /// Parses a complete query.
    pub fn parse(&self, query: &Value) -> PlannerResult<Query> {
        let object = Self::check_structure(query)?;

        let filter = self.parse_where(&object[KEY_WHERE])?;
        let transformations = object
            .get(KEY_TRANSFORMATIONS)
            .map(|t| self.parse_transformations(t))
            .transpose()?;
        let options = self.parse_options(&object[KEY_OPTIONS], transformations.as_ref())?;

        Ok(Query {
            dataset_id: self.dataset_id.to_string(),
            kind: self.kind,
            filter,
            options,
            transformations,
        })
    }

    /// Parses a WHERE body; `{}` yields [`Filter::Empty`].
    pub fn parse_where(&self, where_clause: &Value) -> PlannerResult<Filter> {
        match where_clause {
            Value::Object(object) if object.is_empty() => Ok(Filter::Empty),
            other => self.parse_filter(other),
        }
    }

    /// Parses a non-empty filter node.
    pub fn parse_filter(&self, node: &Value) -> PlannerResult<Filter> {
        let (key, body) = single_entry(node).ok_or_else(|| {
            PlannerError::query_invalid("Filter must be an object with exactly one key")
        })?;

        match key {
            "AND" | "OR" => {
                let items = body.as_array().ok_or_else(|| {
                    PlannerError::query_invalid(format!("{} is not followed by an array", key))
                })?;
                if items.is_empty() {
                    return Err(PlannerError::query_invalid(format!("Empty {}", key)));
                }
                let filters = items
                    .iter()
                    .map(|item| {
                        if !is_filter_node(item) {
                            return Err(PlannerError::query_invalid(format!(
                                "Invalid filter in {}",
                                key
                            )));
                        }
                        self.parse_filter(item)
                    })
                    .collect::<PlannerResult<Vec<_>>>()?;
                Ok(if key == "AND" {
                    Filter::And(filters)
                } else {
                    Filter::Or(filters)
                })
            }
            "GT" | "LT" | "EQ" => {
                let (reference, literal) = single_entry(body).ok_or_else(|| {
                    PlannerError::query_invalid(format!(
                        "{} must contain exactly one key",
                        key
                    ))
                })?;
                let field = self.resolve(reference, FieldRequirement::Numeric)?;
                let value = match literal {
                    Value::Number(n) => n.as_f64(),
                    _ => None,
                }
                .ok_or_else(|| {
                    PlannerError::query_invalid(format!(
                        "Cannot compare number to {} in {}",
                        json_type(literal),
                        key
                    ))
                })?;
                Ok(match key {
                    "GT" => Filter::gt(field, value),
                    "LT" => Filter::lt(field, value),
                    _ => Filter::eq(field, value),
                })
            }
            "IS" => {
                let (reference, literal) = single_entry(body).ok_or_else(|| {
                    PlannerError::query_invalid("IS must contain exactly one key")
                })?;
                let field = self.resolve(reference, FieldRequirement::Text)?;
                let input = literal.as_str().ok_or_else(|| {
                    PlannerError::query_invalid(format!(
                        "Cannot compare string to {} in IS",
                        json_type(literal)
                    ))
                })?;
                let pattern = StringPattern::parse(input).ok_or_else(|| {
                    PlannerError::query_invalid(format!(
                        "Invalid input string '{}' in IS: wildcard only allowed at either end",
                        input
                    ))
                })?;
                Ok(Filter::is(field, pattern))
            }
            "NOT" => {
                if !is_filter_node(body) {
                    return Err(PlannerError::query_invalid("Invalid filter in NOT"));
                }
                Ok(Filter::negate(self.parse_filter(body)?))
            }
            other => Err(PlannerError::query_invalid(format!(
                "Invalid filter key '{}'",
                other
            ))),
        }
    }

    /// Parses a TRANSFORMATIONS body.
    pub fn parse_transformations(&self, transformations: &Value) -> PlannerResult<Transformations> {
        let group = transformations
            .get(KEY_GROUP)
            .ok_or_else(|| PlannerError::query_invalid("TRANSFORMATIONS missing GROUP"))?;
        let apply = transformations
            .get(KEY_APPLY)
            .ok_or_else(|| PlannerError::query_invalid("TRANSFORMATIONS missing APPLY"))?;

        Ok(Transformations::new(
            self.parse_group(group)?,
            self.parse_apply(apply)?,
        ))
    }

    /// Parses GROUP: a non-empty array of distinct qualified fields.
    pub fn parse_group(&self, group: &Value) -> PlannerResult<Vec<Field>> {
        let keys = group
            .as_array()
            .filter(|keys| !keys.is_empty())
            .ok_or_else(|| PlannerError::query_invalid("GROUP must be a non-empty array"))?;

        let mut fields = Vec::with_capacity(keys.len());
        for key in keys {
            let field = FieldCatalog::resolve(self.dataset_id, self.kind, key, FieldRequirement::Any)?;
            if fields.contains(&field) {
                return Err(PlannerError::invalid_key(
                    field.qualified(self.dataset_id),
                    "repeated in GROUP",
                ));
            }
            fields.push(field);
        }
        Ok(fields)
    }

    /// Parses APPLY: an array of `{name: {TOKEN: field}}` rules.
    pub fn parse_apply(&self, apply: &Value) -> PlannerResult<Vec<ApplyRule>> {
        let rules = apply
            .as_array()
            .ok_or_else(|| PlannerError::query_invalid("APPLY must be an array"))?;

        let mut names = HashSet::new();
        let mut parsed = Vec::with_capacity(rules.len());
        for rule in rules {
            let (name, body) = single_entry(rule)
                .ok_or_else(|| PlannerError::query_invalid("Invalid APPLYRULE"))?;
            if name.is_empty() {
                return Err(PlannerError::query_invalid("Apply key cannot be empty"));
            }
            if name.contains('_') {
                return Err(PlannerError::query_invalid(format!(
                    "Apply key '{}' contains underscore",
                    name
                )));
            }
            if !names.insert(name) {
                return Err(PlannerError::query_invalid(format!(
                    "Repeated apply key '{}'",
                    name
                )));
            }

            let (token, reference) = single_entry(body)
                .ok_or_else(|| PlannerError::query_invalid("Invalid APPLYRULE"))?;
            let token = ApplyToken::parse(token).ok_or_else(|| {
                PlannerError::query_invalid(format!("Invalid apply token '{}'", token))
            })?;
            let requirement = if token.requires_numeric() {
                FieldRequirement::Numeric
            } else {
                FieldRequirement::Any
            };
            let field = FieldCatalog::resolve(self.dataset_id, self.kind, reference, requirement)?;

            parsed.push(ApplyRule::new(name, token, field));
        }
        Ok(parsed)
    }

    /// Parses OPTIONS. With transformations, columns may only be group keys
    /// or apply names.
    pub fn parse_options(
        &self,
        options: &Value,
        transformations: Option<&Transformations>,
    ) -> PlannerResult<Options> {
        let raw_columns = options
            .get(KEY_COLUMNS)
            .and_then(Value::as_array)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| PlannerError::query_invalid("COLUMNS must be a non-empty array"))?;

        let mut columns: Vec<Column> = Vec::with_capacity(raw_columns.len());
        for raw in raw_columns {
            let column = match transformations {
                None => {
                    let field =
                        FieldCatalog::resolve(self.dataset_id, self.kind, raw, FieldRequirement::Any)?;
                    Column::field(self.dataset_id, field)
                }
                Some(t) => self.transformed_column(raw, t)?,
            };
            if !columns.iter().any(|c| c.name == column.name) {
                columns.push(column);
            }
        }

        let mut parsed = Options::new(columns);
        if let Some(order) = options.get(KEY_ORDER) {
            let order = Self::parse_order(order, &parsed)?;
            parsed = parsed.with_order(order);
        }
        Ok(parsed)
    }

    fn transformed_column(&self, raw: &Value, transformations: &Transformations) -> PlannerResult<Column> {
        let key = raw
            .as_str()
            .ok_or_else(|| PlannerError::query_invalid(format!("Key {} is not a string", raw)))?;

        if key.contains('_') {
            let field = FieldCatalog::resolve_str(self.dataset_id, self.kind, key, FieldRequirement::Any)?;
            if !transformations.group.contains(&field) {
                return Err(PlannerError::invalid_key(key, "COLUMNS key is not in GROUP"));
            }
            Ok(Column {
                name: key.to_string(),
                source: ColumnSource::Field(field),
            })
        } else if transformations.has_apply(key) {
            Ok(Column::apply(key))
        } else {
            Err(PlannerError::invalid_key(key, "COLUMNS key is not an apply key"))
        }
    }

    fn parse_order(order: &Value, options: &Options) -> PlannerResult<Order> {
        let check_key = |key: &Value| -> PlannerResult<String> {
            match key.as_str() {
                Some(k) if options.has_column(k) => Ok(k.to_string()),
                _ => Err(PlannerError::query_invalid(format!(
                    "ORDER key {} is not in COLUMNS",
                    key
                ))),
            }
        };

        match order {
            Value::String(_) => Ok(Order::Ascending(check_key(order)?)),
            Value::Object(object) => {
                let direction = object
                    .get("dir")
                    .and_then(Value::as_str)
                    .and_then(SortDirection::parse)
                    .ok_or_else(|| PlannerError::query_invalid("Invalid ORDER direction"))?;
                let keys = object
                    .get("keys")
                    .and_then(Value::as_array)
                    .filter(|k| !k.is_empty())
                    .ok_or_else(|| {
                        PlannerError::query_invalid("ORDER keys must be a non-empty array")
                    })?;
                let keys = keys.iter().map(check_key).collect::<PlannerResult<Vec<_>>>()?;
                Ok(Order::Directed { direction, keys })
            }
            _ => Err(PlannerError::query_invalid("Invalid ORDER")),
        }
    }

    fn resolve(&self, reference: &str, requirement: FieldRequirement) -> PlannerResult<Field> {
        FieldCatalog::resolve_str(self.dataset_id, self.kind, reference, requirement)
    }
}

/// True for a non-null, non-array object with exactly one filter keyword.
fn is_filter_node(node: &Value) -> bool {
    single_entry(node).is_some_and(|(key, _)| FILTER_KEYS.contains(&key))
}

/// Returns the only entry of an object with exactly one key.
fn single_entry(value: &Value) -> Option<(&str, &Value)> {
    let object = value.as_object()?;
    if object.len() != 1 {
        return None;
    }
    object.iter().next().map(|(k, v)| (k.as_str(), v))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parser() -> QueryParser<'static> {
        QueryParser::new("courses", DatasetKind::Sections)
    }

    #[test]
    fn test_parse_simple_query() {
        let query = json!({
            "WHERE": {"GT": {"courses_avg": 97}},
            "OPTIONS": {"COLUMNS": ["courses_dept", "courses_avg"], "ORDER": "courses_avg"}
        });
        let parsed = parser().parse(&query).unwrap();
        assert_eq!(parsed.filter, Filter::gt(Field::Avg, 97.0));
        assert_eq!(parsed.options.columns.len(), 2);
        assert_eq!(parsed.options.columns[0].name, "courses_dept");
        assert_eq!(parsed.options.order, Some(Order::ascending("courses_avg")));
        assert!(!parsed.is_transformed());
    }

    #[test]
    fn test_check_structure_rejections() {
        let cases = [
            json!(null),
            json!([]),
            json!({"OPTIONS": {"COLUMNS": ["courses_avg"]}}),
            json!({"WHERE": [], "OPTIONS": {"COLUMNS": ["courses_avg"]}}),
            json!({"WHERE": {}, "OPTIONS": {"ORDER": "courses_avg"}}),
            json!({"WHERE": {}, "OPTIONS": {"COLUMNS": ["courses_avg"], "LIMIT": 3}}),
            json!({"WHERE": {"GT": {"courses_avg": 1}, "LT": {"courses_avg": 5}},
                   "OPTIONS": {"COLUMNS": ["courses_avg"]}}),
            json!({"WHERE": {"XOR": []}, "OPTIONS": {"COLUMNS": ["courses_avg"]}}),
            json!({"WHERE": {}, "OPTIONS": {"COLUMNS": ["courses_avg"]}, "EXTRA": 1}),
            json!({"WHERE": {}, "OPTIONS": {"COLUMNS": ["courses_avg"]},
                   "TRANSFORMATIONS": {"GROUP": ["courses_dept"]}}),
        ];
        for case in cases.iter() {
            assert!(
                QueryParser::check_structure(case).is_err(),
                "expected rejection: {}",
                case
            );
        }
    }

    #[test]
    fn test_empty_where_is_empty_filter() {
        assert_eq!(parser().parse_where(&json!({})).unwrap(), Filter::Empty);
    }

    #[test]
    fn test_logic_requires_non_empty_array() {
        assert!(parser().parse_filter(&json!({"AND": []})).is_err());
        assert!(parser().parse_filter(&json!({"OR": {"GT": {"courses_avg": 1}}})).is_err());
        assert!(parser().parse_filter(&json!({"AND": [{}]})).is_err());
    }

    #[test]
    fn test_nested_filters() {
        let filter = parser()
            .parse_filter(&json!({
                "OR": [
                    {"AND": [{"IS": {"courses_dept": "cp*"}}, {"EQ": {"courses_year": 2015}}]},
                    {"NOT": {"LT": {"courses_pass": 10}}}
                ]
            }))
            .unwrap();
        assert_eq!(
            filter,
            Filter::Or(vec![
                Filter::And(vec![
                    Filter::is(Field::Dept, StringPattern::Prefix("cp".into())),
                    Filter::eq(Field::Year, 2015.0),
                ]),
                Filter::negate(Filter::lt(Field::Pass, 10.0)),
            ])
        );
    }

    #[test]
    fn test_comparison_type_checks() {
        assert!(parser().parse_filter(&json!({"GT": {"courses_avg": "90"}})).is_err());
        assert!(parser().parse_filter(&json!({"GT": {"courses_dept": 90}})).is_err());
        assert!(parser().parse_filter(&json!({"IS": {"courses_avg": "9*"}})).is_err());
        assert!(parser().parse_filter(&json!({"IS": {"courses_dept": 5}})).is_err());
        assert!(parser()
            .parse_filter(&json!({"EQ": {"courses_avg": 1, "courses_pass": 2}}))
            .is_err());
        assert!(parser().parse_filter(&json!({"GT": {}})).is_err());
    }

    #[test]
    fn test_interior_wildcard_rejected() {
        let err = parser()
            .parse_filter(&json!({"IS": {"courses_dept": "c*s"}}))
            .unwrap_err();
        assert!(err.message().contains("wildcard"));
    }

    #[test]
    fn test_not_requires_filter() {
        assert!(parser().parse_filter(&json!({"NOT": {}})).is_err());
        assert!(parser().parse_filter(&json!({"NOT": []})).is_err());
    }

    #[test]
    fn test_parse_transformations() {
        let transformations = parser()
            .parse_transformations(&json!({
                "GROUP": ["courses_dept", "courses_year"],
                "APPLY": [
                    {"avgGrade": {"AVG": "courses_avg"}},
                    {"profs": {"COUNT": "courses_instructor"}}
                ]
            }))
            .unwrap();
        assert_eq!(transformations.group, vec![Field::Dept, Field::Year]);
        assert_eq!(
            transformations.apply,
            vec![
                ApplyRule::new("avgGrade", ApplyToken::Avg, Field::Avg),
                ApplyRule::new("profs", ApplyToken::Count, Field::Instructor),
            ]
        );
    }

    #[test]
    fn test_apply_rule_validation() {
        let p = parser();
        assert!(p.parse_apply(&json!([{"bad_name": {"MAX": "courses_avg"}}])).is_err());
        assert!(p
            .parse_apply(&json!([{"x": {"MAX": "courses_avg"}}, {"x": {"MIN": "courses_avg"}}]))
            .is_err());
        assert!(p.parse_apply(&json!([{"x": {"MEDIAN": "courses_avg"}}])).is_err());
        assert!(p.parse_apply(&json!([{"x": {"SUM": "courses_dept"}}])).is_err());
        assert!(p.parse_apply(&json!([{"x": {"COUNT": "courses_dept"}}])).is_ok());
        assert!(p.parse_apply(&json!([{"x": {"MAX": "courses_avg", "MIN": "courses_avg"}}])).is_err());
        assert!(p.parse_apply(&json!({"x": {"MAX": "courses_avg"}})).is_err());
        assert!(p.parse_apply(&json!([])).unwrap().is_empty());
    }

    #[test]
    fn test_group_validation() {
        let p = parser();
        assert!(p.parse_group(&json!([])).is_err());
        assert!(p.parse_group(&json!("courses_dept")).is_err());
        assert!(p.parse_group(&json!(["courses_dept", "courses_dept"])).is_err());
        assert!(p.parse_group(&json!(["maxAvg"])).is_err());
    }

    #[test]
    fn test_transformed_columns() {
        let p = parser();
        let t = Transformations::new(
            vec![Field::Dept],
            vec![ApplyRule::new("maxAvg", ApplyToken::Max, Field::Avg)],
        );

        let options = p
            .parse_options(&json!({"COLUMNS": ["courses_dept", "maxAvg"]}), Some(&t))
            .unwrap();
        assert_eq!(options.columns[0].source, ColumnSource::Field(Field::Dept));
        assert_eq!(options.columns[1].source, ColumnSource::Apply);

        // field not in GROUP
        assert!(p
            .parse_options(&json!({"COLUMNS": ["courses_avg"]}), Some(&t))
            .is_err());
        // unknown apply key
        assert!(p
            .parse_options(&json!({"COLUMNS": ["minAvg"]}), Some(&t))
            .is_err());
    }

    #[test]
    fn test_duplicate_columns_collapsed() {
        let options = parser()
            .parse_options(&json!({"COLUMNS": ["courses_avg", "courses_dept", "courses_avg"]}), None)
            .unwrap();
        assert_eq!(options.columns.len(), 2);
    }

    #[test]
    fn test_order_validation() {
        let p = parser();
        assert!(p
            .parse_options(&json!({"COLUMNS": ["courses_avg"], "ORDER": "courses_dept"}), None)
            .is_err());
        assert!(p
            .parse_options(
                &json!({"COLUMNS": ["courses_avg"], "ORDER": {"dir": "SIDEWAYS", "keys": ["courses_avg"]}}),
                None
            )
            .is_err());
        assert!(p
            .parse_options(&json!({"COLUMNS": ["courses_avg"], "ORDER": {"dir": "UP", "keys": []}}), None)
            .is_err());
        assert!(p
            .parse_options(&json!({"COLUMNS": ["courses_avg"], "ORDER": 3}), None)
            .is_err());

        let options = p
            .parse_options(
                &json!({"COLUMNS": ["courses_avg", "courses_dept"],
                        "ORDER": {"dir": "DOWN", "keys": ["courses_dept", "courses_avg"]}}),
                None,
            )
            .unwrap();
        assert_eq!(
            options.order,
            Some(Order::directed(SortDirection::Down, ["courses_dept", "courses_avg"]))
        );
    }
}
