//! Result types for query execution

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use crate::dataset::FieldValue;

/// One output row. Keys keep COLUMNS order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultRow {
    entries: Vec<(String, FieldValue)>,
}

impl ResultRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a column value
    pub fn push(&mut self, key: impl Into<String>, value: FieldValue) {
        self.entries.push((key.into(), value));
    }

    /// Builder-style append
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.push(key, value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Converts into a JSON object
    pub fn to_json(&self) -> Value {
        let object: Map<String, Value> = self
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        Value::Object(object)
    }
}

impl Serialize for ResultRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Result of query execution
#[derive(Debug, Clone, Default)]
pub struct ExecutionResult {
    /// Rows in result order
    pub rows: Vec<ResultRow>,
    /// Records in the dataset
    pub scanned_count: usize,
    /// Records that passed WHERE
    pub matched_count: usize,
    /// Whether GROUP/APPLY ran
    pub transformed: bool,
}

impl ExecutionResult {
    /// Returns true if no rows were produced
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns an iterator over the rows
    pub fn iter(&self) -> impl Iterator<Item = &ResultRow> {
        self.rows.iter()
    }

    /// Consumes the result, returning its rows
    pub fn into_rows(self) -> Vec<ResultRow> {
        self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_keeps_column_order() {
        let row = ResultRow::new()
            .with("courses_title", "intro")
            .with("courses_avg", 75.5);
        let keys: Vec<_> = row.keys().collect();
        assert_eq!(keys, vec!["courses_title", "courses_avg"]);

        let text = serde_json::to_string(&row).unwrap();
        assert_eq!(text, r#"{"courses_title":"intro","courses_avg":75.5}"#);
    }

    #[test]
    fn test_row_to_json() {
        let row = ResultRow::new().with("courses_dept", "cpsc").with("n", 3i64);
        assert_eq!(row.to_json(), json!({"courses_dept": "cpsc", "n": 3}));
        assert_eq!(row.get("n"), Some(&FieldValue::Number(3.0)));
    }

    #[test]
    fn test_execution_result_empty() {
        let result = ExecutionResult::default();
        assert!(result.is_empty());
        assert_eq!(result.len(), 0);
    }
}
