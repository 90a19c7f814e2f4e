//! Result sorting for query execution
//!
//! Sorts output rows by ORDER keys, deterministically.

use std::cmp::Ordering;

use super::result::ResultRow;
use crate::planner::{Order, SortDirection};

/// Sorts result rows
pub struct ResultSorter;

impl ResultSorter {
    /// Sorts rows according to an ORDER clause.
    ///
    /// Keys are compared lexicographically in listed order. Sort is stable:
    /// rows equal on every key keep their relative order, in both
    /// directions.
    pub fn sort(rows: &mut [ResultRow], order: &Order) {
        let keys = order.keys();
        let direction = order.direction();

        rows.sort_by(|a, b| {
            let ordering = keys
                .iter()
                .map(|key| Self::compare_values(a, b, key))
                .find(|o| *o != Ordering::Equal)
                .unwrap_or(Ordering::Equal);

            match direction {
                SortDirection::Up => ordering,
                SortDirection::Down => ordering.reverse(),
            }
        });
    }

    /// Compares two rows at one key.
    ///
    /// Ordering rules:
    /// - missing < present
    /// - number < string
    /// - same types use natural ordering
    fn compare_values(a: &ResultRow, b: &ResultRow, key: &str) -> Ordering {
        match (a.get(key), b.get(key)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a_val), Some(b_val)) => a_val.compare(b_val),
        }
    }
}
