//! Record representation
//!
//! A record is a flat mapping from a kind's declared fields to values.
//! Field names are bare here; the dataset id is only attached when a value
//! leaves the engine in a result row.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Number, Value};

use crate::catalog::{DatasetKind, Field, FieldType};

use super::errors::{DatasetError, DatasetResult};

/// A single stored or aggregated value
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Number(_) => None,
        }
    }

    /// Natural ordering: numbers by value, strings by code point.
    ///
    /// Numbers sort before strings; incomparable numbers (NaN) compare equal
    /// so that stable sorting keeps their input order.
    pub fn compare(&self, other: &FieldValue) -> Ordering {
        match (self, other) {
            (FieldValue::Number(a), FieldValue::Number(b)) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (FieldValue::Text(a), FieldValue::Text(b)) => a.cmp(b),
            (FieldValue::Number(_), FieldValue::Text(_)) => Ordering::Less,
            (FieldValue::Text(_), FieldValue::Number(_)) => Ordering::Greater,
        }
    }

    /// Hashable key with structural equality semantics
    pub fn key(&self) -> ValueKey {
        match self {
            // -0.0 and 0.0 are the same value
            FieldValue::Number(n) if *n == 0.0 => ValueKey::Number(0.0f64.to_bits()),
            FieldValue::Number(n) => ValueKey::Number(n.to_bits()),
            FieldValue::Text(s) => ValueKey::Text(s.clone()),
        }
    }

    /// Converts into a JSON value. Whole numbers are written without a
    /// fraction; non-finite numbers become null.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Number(n) => match whole_number(*n) {
                Some(i) => Value::Number(Number::from(i)),
                None => Number::from_f64(*n).map(Value::Number).unwrap_or(Value::Null),
            },
            FieldValue::Text(s) => Value::String(s.clone()),
        }
    }

    fn from_json(value: &Value, expected: FieldType) -> Option<Self> {
        match (expected, value) {
            (FieldType::Numeric, Value::Number(n)) => n.as_f64().map(FieldValue::Number),
            (FieldType::Text, Value::String(s)) => Some(FieldValue::Text(s.clone())),
            _ => None,
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Number(n) => match whole_number(*n) {
                Some(i) => serializer.serialize_i64(i),
                None if n.is_finite() => serializer.serialize_f64(*n),
                None => serializer.serialize_unit(),
            },
            FieldValue::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// Integer view of `n` when it has no fractional part and fits in i64
fn whole_number(n: f64) -> Option<i64> {
    const LIMIT: f64 = 9_223_372_036_854_775_808.0; // 2^63
    if n.is_finite() && n.fract() == 0.0 && n >= -LIMIT && n < LIMIT {
        Some(n as i64)
    } else {
        None
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Number(n as f64)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

/// Structural-equality key for grouping and distinct counting
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKey {
    Number(u64),
    Text(String),
}

/// A flat record keyed by the closed field enum
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    values: BTreeMap<Field, FieldValue>,
}

impl Record {
    /// Creates an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field value (builder style)
    pub fn with(mut self, field: Field, value: impl Into<FieldValue>) -> Self {
        self.values.insert(field, value.into());
        self
    }

    /// Sets a field value
    pub fn set(&mut self, field: Field, value: impl Into<FieldValue>) {
        self.values.insert(field, value.into());
    }

    pub fn get(&self, field: Field) -> Option<&FieldValue> {
        self.values.get(&field)
    }

    pub fn number(&self, field: Field) -> Option<f64> {
        self.get(field).and_then(FieldValue::as_number)
    }

    pub fn text(&self, field: Field) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_text)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Checks that the record holds exactly the kind's fields with the
    /// declared types.
    pub fn conforms_to(&self, kind: DatasetKind) -> DatasetResult<()> {
        for field in kind.fields() {
            let ok = match (field.field_type(), self.get(*field)) {
                (FieldType::Numeric, Some(FieldValue::Number(_))) => true,
                (FieldType::Text, Some(FieldValue::Text(_))) => true,
                _ => false,
            };
            if !ok {
                return Err(DatasetError::InvalidRecord(format!(
                    "field '{}' missing or not a {}",
                    field,
                    field.field_type().type_name()
                )));
            }
        }
        if let Some(extra) = self.values.keys().find(|f| !kind.declares(**f)) {
            return Err(DatasetError::InvalidRecord(format!(
                "field '{}' is not declared for {}",
                extra, kind
            )));
        }
        Ok(())
    }

    /// Builds a record from a flat JSON object produced by ingestion.
    pub fn from_json(kind: DatasetKind, value: &Value) -> DatasetResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| DatasetError::InvalidRecord("record is not an object".into()))?;

        if let Some(extra) = object
            .keys()
            .find(|k| !Field::from_name(k).is_some_and(|f| kind.declares(f)))
        {
            return Err(DatasetError::InvalidRecord(format!(
                "field '{}' is not declared for {}",
                extra, kind
            )));
        }

        let mut record = Record::new();
        for field in kind.fields() {
            let raw = object.get(field.name()).ok_or_else(|| {
                DatasetError::InvalidRecord(format!("missing field '{}'", field))
            })?;
            let value = FieldValue::from_json(raw, field.field_type()).ok_or_else(|| {
                DatasetError::InvalidRecord(format!(
                    "field '{}' must be a {}",
                    field,
                    field.field_type().type_name()
                ))
            })?;
            record.set(*field, value);
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn room_json() -> Value {
        json!({
            "fullname": "Hugh Dempster Pavilion",
            "shortname": "DMP",
            "number": "110",
            "name": "DMP_110",
            "address": "6245 Agronomy Road V6T 1Z4",
            "lat": 49.26125,
            "lon": -123.24807,
            "seats": 120,
            "type": "Tiered Large Group",
            "furniture": "Classroom-Fixed Tablets",
            "href": "http://example.org/rooms/DMP-110"
        })
    }

    #[test]
    fn test_from_json_room() {
        let record = Record::from_json(DatasetKind::Rooms, &room_json()).unwrap();
        assert_eq!(record.len(), 11);
        assert_eq!(record.number(Field::Seats), Some(120.0));
        assert_eq!(record.text(Field::Name), Some("DMP_110"));
        assert!(record.conforms_to(DatasetKind::Rooms).is_ok());
    }

    #[test]
    fn test_from_json_rejects_wrong_type() {
        let mut value = room_json();
        value["seats"] = json!("120");
        assert!(matches!(
            Record::from_json(DatasetKind::Rooms, &value),
            Err(DatasetError::InvalidRecord(_))
        ));
    }

    #[test]
    fn test_from_json_rejects_undeclared_field() {
        let mut value = room_json();
        value["avg"] = json!(80);
        assert!(Record::from_json(DatasetKind::Rooms, &value).is_err());
    }

    #[test]
    fn test_from_json_rejects_missing_field() {
        let mut value = room_json();
        value.as_object_mut().unwrap().remove("href");
        assert!(Record::from_json(DatasetKind::Rooms, &value).is_err());
    }

    #[test]
    fn test_compare_natural_order() {
        let a = FieldValue::from(2.5);
        let b = FieldValue::from(10i64);
        assert_eq!(a.compare(&b), Ordering::Less);

        let x = FieldValue::from("Zebra");
        let y = FieldValue::from("apple");
        // code point order: uppercase before lowercase
        assert_eq!(x.compare(&y), Ordering::Less);
    }

    #[test]
    fn test_key_structural_equality() {
        assert_eq!(FieldValue::from(0.0).key(), FieldValue::from(-0.0).key());
        assert_eq!(FieldValue::from(85i64).key(), FieldValue::from(85.0).key());
        assert_ne!(FieldValue::from("85").key(), FieldValue::from(85.0).key());
    }

    #[test]
    fn test_to_json() {
        assert_eq!(FieldValue::from("cs").to_json(), json!("cs"));
        assert_eq!(FieldValue::from(1.5).to_json(), json!(1.5));
        assert_eq!(FieldValue::from(f64::NAN).to_json(), Value::Null);
    }

    #[test]
    fn test_whole_numbers_have_no_fraction() {
        assert_eq!(FieldValue::from(2015.0).to_json(), json!(2015));
        assert_eq!(FieldValue::from(-0.0).to_json(), json!(0));
        assert_eq!(serde_json::to_string(&FieldValue::from(2015.0)).unwrap(), "2015");
        assert_eq!(serde_json::to_string(&FieldValue::from(85.25)).unwrap(), "85.25");
        assert_eq!(serde_json::to_string(&FieldValue::from(1e300)).unwrap(), "1e300");
    }
}
