//! Field Catalog
//!
//! Static registry of the fields each dataset kind declares, and the single
//! place where a qualified field reference (`datasetId_field`) is resolved to
//! a typed [`Field`].
//!
//! The catalog holds no state. Resolution fails with an invalid-query error
//! when the reference:
//!
//! - is not a string
//! - has no `_` separator
//! - is prefixed with an id other than the dataset being queried
//! - names a field the dataset kind does not declare
//! - names a field of the wrong type for the caller's requirement

mod fields;

pub use fields::{DatasetKind, Field, FieldType};

use serde_json::Value;

use crate::planner::{PlannerError, PlannerResult};

/// Type restriction a caller places on a resolved field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRequirement {
    /// Any declared field
    Any,
    /// Numeric fields only (GT/LT/EQ, MAX/MIN/SUM/AVG)
    Numeric,
    /// Text fields only (IS)
    Text,
}

/// Resolves qualified field references against a dataset kind
pub struct FieldCatalog;

impl FieldCatalog {
    /// Splits a qualified reference at its first `_`.
    pub fn split_reference(reference: &str) -> Option<(&str, &str)> {
        reference.split_once('_')
    }

    /// Resolves a JSON value that should hold a qualified reference.
    pub fn resolve(
        dataset_id: &str,
        kind: DatasetKind,
        reference: &Value,
        requirement: FieldRequirement,
    ) -> PlannerResult<Field> {
        let key = reference
            .as_str()
            .ok_or_else(|| PlannerError::query_invalid(format!("Key {} is not a string", reference)))?;
        Self::resolve_str(dataset_id, kind, key, requirement)
    }

    /// Resolves a qualified reference string to its bare field.
    pub fn resolve_str(
        dataset_id: &str,
        kind: DatasetKind,
        key: &str,
        requirement: FieldRequirement,
    ) -> PlannerResult<Field> {
        let (prefix, name) = Self::split_reference(key)
            .ok_or_else(|| PlannerError::invalid_key(key, "missing dataset id prefix"))?;

        if prefix != dataset_id {
            return Err(PlannerError::invalid_key(
                key,
                format!("expected dataset '{}'", dataset_id),
            ));
        }

        let field = Field::from_name(name)
            .filter(|f| kind.declares(*f))
            .ok_or_else(|| PlannerError::invalid_key(key, format!("not a {} field", kind)))?;

        match (requirement, field.field_type()) {
            (FieldRequirement::Numeric, FieldType::Text) => {
                Err(PlannerError::invalid_key(key, "expected a numeric field"))
            }
            (FieldRequirement::Text, FieldType::Numeric) => {
                Err(PlannerError::invalid_key(key, "expected a string field"))
            }
            _ => Ok(field),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_any() {
        let field =
            FieldCatalog::resolve_str("courses", DatasetKind::Sections, "courses_dept", FieldRequirement::Any)
                .unwrap();
        assert_eq!(field, Field::Dept);
    }

    #[test]
    fn test_resolve_rejects_wrong_prefix() {
        let err =
            FieldCatalog::resolve_str("courses", DatasetKind::Sections, "rooms_dept", FieldRequirement::Any)
                .unwrap_err();
        assert_eq!(err.field(), Some("rooms_dept"));
    }

    #[test]
    fn test_resolve_rejects_missing_separator() {
        assert!(
            FieldCatalog::resolve_str("courses", DatasetKind::Sections, "coursesavg", FieldRequirement::Any)
                .is_err()
        );
    }

    #[test]
    fn test_resolve_rejects_field_of_other_kind() {
        assert!(
            FieldCatalog::resolve_str("courses", DatasetKind::Sections, "courses_seats", FieldRequirement::Any)
                .is_err()
        );
        assert!(
            FieldCatalog::resolve_str("rooms", DatasetKind::Rooms, "rooms_seats", FieldRequirement::Numeric)
                .is_ok()
        );
    }

    #[test]
    fn test_resolve_enforces_requirement() {
        assert!(FieldCatalog::resolve_str(
            "courses",
            DatasetKind::Sections,
            "courses_dept",
            FieldRequirement::Numeric
        )
        .is_err());
        assert!(FieldCatalog::resolve_str(
            "courses",
            DatasetKind::Sections,
            "courses_avg",
            FieldRequirement::Text
        )
        .is_err());
    }

    #[test]
    fn test_resolve_non_string_reference() {
        let err =
            FieldCatalog::resolve("courses", DatasetKind::Sections, &json!(42), FieldRequirement::Any)
                .unwrap_err();
        assert!(err.message().contains("not a string"));
    }

    #[test]
    fn test_extra_separator_is_not_a_field() {
        assert!(FieldCatalog::resolve_str(
            "courses",
            DatasetKind::Sections,
            "courses_avg_x",
            FieldRequirement::Any
        )
        .is_err());
    }
}
