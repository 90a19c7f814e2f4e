//! Query AST
//!
//! The validated, typed form of a query. Raw JSON is turned into these
//! structures by [`QueryParser`](super::QueryParser); nothing downstream
//! inspects JSON keys again.

use std::fmt;

use crate::catalog::{DatasetKind, Field};

/// WHERE filter tree
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `{}`: matches every record
    Empty,
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Gt { field: Field, value: f64 },
    Lt { field: Field, value: f64 },
    Eq { field: Field, value: f64 },
    Is { field: Field, pattern: StringPattern },
    Not(Box<Filter>),
}

impl Filter {
    pub fn gt(field: Field, value: f64) -> Self {
        Filter::Gt { field, value }
    }

    pub fn lt(field: Field, value: f64) -> Self {
        Filter::Lt { field, value }
    }

    pub fn eq(field: Field, value: f64) -> Self {
        Filter::Eq { field, value }
    }

    pub fn is(field: Field, pattern: StringPattern) -> Self {
        Filter::Is { field, pattern }
    }

    pub fn negate(filter: Filter) -> Self {
        Filter::Not(Box::new(filter))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Filter::Empty)
    }
}

/// IS comparison pattern. `*` is only allowed as the first and/or last
/// character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StringPattern {
    /// `*` or `**`
    Any,
    /// `*text*`
    Contains(String),
    /// `*text`
    Suffix(String),
    /// `text*`
    Prefix(String),
    /// `text`
    Exact(String),
}

impl StringPattern {
    /// Parses a pattern; returns `None` if it has an interior wildcard.
    pub fn parse(input: &str) -> Option<Self> {
        if input == "*" || input == "**" {
            return Some(StringPattern::Any);
        }

        let leading = input.strip_prefix('*');
        let body = leading.unwrap_or(input);
        let trailing = body.strip_suffix('*');
        let inner = trailing.unwrap_or(body);

        if inner.contains('*') {
            return None;
        }

        let inner = inner.to_string();
        Some(match (leading.is_some(), trailing.is_some()) {
            (true, true) => StringPattern::Contains(inner),
            (true, false) => StringPattern::Suffix(inner),
            (false, true) => StringPattern::Prefix(inner),
            (false, false) => StringPattern::Exact(inner),
        })
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            StringPattern::Any => true,
            StringPattern::Contains(s) => value.contains(s.as_str()),
            StringPattern::Suffix(s) => value.ends_with(s.as_str()),
            StringPattern::Prefix(s) => value.starts_with(s.as_str()),
            StringPattern::Exact(s) => value == s,
        }
    }
}

/// Sort direction for ORDER objects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Up,
    Down,
}

impl SortDirection {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "UP" => Some(SortDirection::Up),
            "DOWN" => Some(SortDirection::Down),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Up => "UP",
            SortDirection::Down => "DOWN",
        }
    }
}

/// ORDER clause. Keys are output column names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Order {
    /// Bare string: ascending by one column
    Ascending(String),
    /// `{dir, keys}`: lexicographic over keys in the given direction
    Directed {
        direction: SortDirection,
        keys: Vec<String>,
    },
}

impl Order {
    pub fn ascending(key: impl Into<String>) -> Self {
        Order::Ascending(key.into())
    }

    pub fn directed(direction: SortDirection, keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Order::Directed {
            direction,
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn direction(&self) -> SortDirection {
        match self {
            Order::Ascending(_) => SortDirection::Up,
            Order::Directed { direction, .. } => *direction,
        }
    }

    /// Sort keys in priority order
    pub fn keys(&self) -> &[String] {
        match self {
            Order::Ascending(key) => std::slice::from_ref(key),
            Order::Directed { keys, .. } => keys,
        }
    }
}

/// Where an output column's value comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSource {
    /// A dataset field (or group key when transformed)
    Field(Field),
    /// The apply rule with the column's name
    Apply,
}

/// One output column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Output key: `id_field` or an apply name
    pub name: String,
    pub source: ColumnSource,
}

impl Column {
    pub fn field(dataset_id: &str, field: Field) -> Self {
        Self {
            name: field.qualified(dataset_id),
            source: ColumnSource::Field(field),
        }
    }

    pub fn apply(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: ColumnSource::Apply,
        }
    }
}

/// OPTIONS clause
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    /// Distinct output columns in first-mention order
    pub columns: Vec<Column>,
    pub order: Option<Order>,
}

impl Options {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            order: None,
        }
    }

    pub fn with_order(mut self, order: Order) -> Self {
        self.order = Some(order);
        self
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }
}

/// Aggregation tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyToken {
    Max,
    Min,
    Sum,
    Avg,
    Count,
}

impl ApplyToken {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "MAX" => Some(ApplyToken::Max),
            "MIN" => Some(ApplyToken::Min),
            "SUM" => Some(ApplyToken::Sum),
            "AVG" => Some(ApplyToken::Avg),
            "COUNT" => Some(ApplyToken::Count),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplyToken::Max => "MAX",
            ApplyToken::Min => "MIN",
            ApplyToken::Sum => "SUM",
            ApplyToken::Avg => "AVG",
            ApplyToken::Count => "COUNT",
        }
    }

    /// COUNT accepts any field; the rest need numeric fields
    pub fn requires_numeric(&self) -> bool {
        !matches!(self, ApplyToken::Count)
    }
}

impl fmt::Display for ApplyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named aggregation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyRule {
    pub name: String,
    pub token: ApplyToken,
    pub field: Field,
}

impl ApplyRule {
    pub fn new(name: impl Into<String>, token: ApplyToken, field: Field) -> Self {
        Self {
            name: name.into(),
            token,
            field,
        }
    }
}

/// TRANSFORMATIONS clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformations {
    /// Distinct group fields in listed order
    pub group: Vec<Field>,
    pub apply: Vec<ApplyRule>,
}

impl Transformations {
    pub fn new(group: Vec<Field>, apply: Vec<ApplyRule>) -> Self {
        Self { group, apply }
    }

    pub fn has_apply(&self, name: &str) -> bool {
        self.apply.iter().any(|r| r.name == name)
    }
}

/// A fully validated query bound to one dataset
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub dataset_id: String,
    pub kind: DatasetKind,
    pub filter: Filter,
    pub options: Options,
    pub transformations: Option<Transformations>,
}

impl Query {
    pub fn is_transformed(&self) -> bool {
        self.transformations.is_some()
    }
}
