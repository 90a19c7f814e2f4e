//! Dataset id resolution
//!
//! A query names its dataset implicitly: every qualified field reference
//! (`id_field`) carries the id as a prefix. All references must agree on a
//! single id.
//!
//! References are collected from the positions where the query language
//! allows them:
//!
//! - keys of GT/LT/EQ/IS bodies anywhere in the WHERE tree
//! - COLUMNS entries and ORDER keys that contain `_`
//! - GROUP entries and the field of each APPLY rule
//!
//! Malformed shapes are skipped here; the parser reports them.

use serde_json::Value;

use crate::catalog::FieldCatalog;

use super::errors::{PlannerError, PlannerResult};
use super::parser::{KEY_APPLY, KEY_COLUMNS, KEY_GROUP, KEY_OPTIONS, KEY_ORDER, KEY_TRANSFORMATIONS, KEY_WHERE};

/// Collects the dataset id prefixes referenced by a query, in encounter order.
pub fn collect_dataset_ids(query: &Value) -> Vec<String> {
    let mut ids = Vec::new();

    if let Some(filter) = query.get(KEY_WHERE) {
        collect_from_filter(filter, &mut ids);
    }

    if let Some(options) = query.get(KEY_OPTIONS) {
        if let Some(columns) = options.get(KEY_COLUMNS).and_then(Value::as_array) {
            columns.iter().for_each(|c| push_reference(c, &mut ids));
        }
        match options.get(KEY_ORDER) {
            Some(order @ Value::String(_)) => push_reference(order, &mut ids),
            Some(Value::Object(order)) => {
                if let Some(keys) = order.get("keys").and_then(Value::as_array) {
                    keys.iter().for_each(|k| push_reference(k, &mut ids));
                }
            }
            _ => {}
        }
    }

    if let Some(transformations) = query.get(KEY_TRANSFORMATIONS) {
        if let Some(group) = transformations.get(KEY_GROUP).and_then(Value::as_array) {
            group.iter().for_each(|g| push_reference(g, &mut ids));
        }
        if let Some(apply) = transformations.get(KEY_APPLY).and_then(Value::as_array) {
            for rule in apply.iter().filter_map(Value::as_object) {
                for body in rule.values().filter_map(Value::as_object) {
                    body.values().for_each(|f| push_reference(f, &mut ids));
                }
            }
        }
    }

    ids
}

/// Resolves the single dataset id a query refers to.
pub fn resolve_dataset_id(query: &Value) -> PlannerResult<String> {
    let ids = collect_dataset_ids(query);

    let first = ids
        .first()
        .ok_or_else(|| PlannerError::dataset_reference("no dataset referenced"))?;

    if let Some(other) = ids.iter().find(|id| *id != first) {
        return Err(PlannerError::dataset_reference(format!(
            "references both '{}' and '{}'",
            first, other
        )));
    }

    if first.trim().is_empty() {
        return Err(PlannerError::dataset_reference("empty dataset id"));
    }

    Ok(first.clone())
}

fn collect_from_filter(node: &Value, ids: &mut Vec<String>) {
    let Some(object) = node.as_object() else {
        return;
    };
    for (key, value) in object {
        match key.as_str() {
            "AND" | "OR" => {
                if let Some(items) = value.as_array() {
                    items.iter().for_each(|f| collect_from_filter(f, ids));
                }
            }
            "NOT" => collect_from_filter(value, ids),
            "GT" | "LT" | "EQ" | "IS" => {
                if let Some(body) = value.as_object() {
                    for reference in body.keys() {
                        push_key(reference, ids);
                    }
                }
            }
            _ => {}
        }
    }
}

fn push_reference(value: &Value, ids: &mut Vec<String>) {
    if let Some(s) = value.as_str() {
        push_key(s, ids);
    }
}

fn push_key(key: &str, ids: &mut Vec<String>) {
    if let Some((prefix, _)) = FieldCatalog::split_reference(key) {
        ids.push(prefix.to_string());
    }
}
