//! Dataset Store Tests
//!
//! Tests for store lifecycle:
//! - Ids are validated on add and remove
//! - Listing is sorted and reports row counts
//! - Removed datasets can no longer be queried
//! - Snapshots held by readers survive removal

use std::sync::Arc;
use std::thread;

use campusquery::catalog::DatasetKind;
use campusquery::dataset::{DatasetError, DatasetStore, Record};
use campusquery::executor::{DatasetSource, ExecutorErrorCode, QueryEngine};
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn room(name: &str, seats: f64) -> Record {
    Record::from_json(
        DatasetKind::Rooms,
        &json!({
            "fullname": "Buchanan",
            "shortname": "BUCH",
            "number": name,
            "name": format!("BUCH_{}", name),
            "address": "1866 Main Mall",
            "lat": 49.26826,
            "lon": -123.25468,
            "seats": seats,
            "type": "Open Design General Purpose",
            "furniture": "Classroom-Movable Tables & Chairs",
            "href": format!("http://example.org/BUCH-{}", name)
        }),
    )
    .unwrap()
}

// =============================================================================
// Add / Remove Tests
// =============================================================================

/// Add returns every loaded id, sorted.
#[test]
fn test_add_returns_sorted_ids() {
    let store = DatasetStore::new();
    assert_eq!(
        store
            .add_dataset("zeta", DatasetKind::Rooms, vec![room("A101", 30.0)])
            .unwrap(),
        vec!["zeta"]
    );
    assert_eq!(
        store
            .add_dataset("alpha", DatasetKind::Rooms, vec![room("A102", 40.0)])
            .unwrap(),
        vec!["alpha", "zeta"]
    );
}

/// Invalid ids are rejected on add.
#[test]
fn test_add_invalid_ids() {
    let store = DatasetStore::new();
    for id in ["", "   ", "my_rooms"] {
        let err = store
            .add_dataset(id, DatasetKind::Rooms, vec![room("A101", 30.0)])
            .unwrap_err();
        assert!(matches!(err, DatasetError::InvalidId(_)));
    }
    assert!(store.is_empty());
}

/// Adding an existing id is rejected and leaves the original in place.
#[test]
fn test_add_duplicate() {
    let store = DatasetStore::new();
    store
        .add_dataset("rooms", DatasetKind::Rooms, vec![room("A101", 30.0)])
        .unwrap();
    let err = store
        .add_dataset("rooms", DatasetKind::Rooms, vec![])
        .unwrap_err();
    assert_eq!(err, DatasetError::AlreadyExists("rooms".into()));
    assert_eq!(store.list_datasets()[0].num_rows, 1);
}

/// Remove distinguishes invalid ids from missing ones.
#[test]
fn test_remove() {
    let store = DatasetStore::new();
    store
        .add_dataset("rooms", DatasetKind::Rooms, vec![room("A101", 30.0)])
        .unwrap();

    assert!(matches!(
        store.remove_dataset("bad_id"),
        Err(DatasetError::InvalidId(_))
    ));
    let missing = store.remove_dataset("other").unwrap_err();
    assert!(missing.is_not_found());

    assert_eq!(store.remove_dataset("rooms").unwrap(), "rooms");
    assert!(store.is_empty());
}

// =============================================================================
// Listing Tests
// =============================================================================

/// Summaries carry kind and row count, serialized the way clients expect.
#[test]
fn test_list_datasets() {
    let store = DatasetStore::new();
    store
        .add_dataset(
            "rooms",
            DatasetKind::Rooms,
            vec![room("A101", 30.0), room("A102", 40.0)],
        )
        .unwrap();

    let listing = serde_json::to_value(store.list_datasets()).unwrap();
    assert_eq!(
        listing,
        json!([{"id": "rooms", "kind": "rooms", "numRows": 2}])
    );
}

// =============================================================================
// Query Interaction Tests
// =============================================================================

/// A removed dataset is an unknown dataset to the query engine.
#[test]
fn test_removed_dataset_not_queryable() {
    let store = DatasetStore::new();
    store
        .add_dataset("rooms", DatasetKind::Rooms, vec![room("A101", 30.0)])
        .unwrap();
    let query = json!({"WHERE": {}, "OPTIONS": {"COLUMNS": ["rooms_name"]}});

    assert_eq!(QueryEngine::new(&store).perform_query(&query).unwrap().len(), 1);

    store.remove_dataset("rooms").unwrap();
    let err = QueryEngine::new(&store).perform_query(&query).unwrap_err();
    assert_eq!(err.code(), ExecutorErrorCode::InsightQueryInvalid);
}

/// A snapshot taken before removal stays readable.
#[test]
fn test_snapshot_survives_removal() {
    let store = DatasetStore::new();
    store
        .add_dataset("rooms", DatasetKind::Rooms, vec![room("A101", 30.0)])
        .unwrap();

    let snapshot = store.dataset("rooms").unwrap();
    store.remove_dataset("rooms").unwrap();
    assert_eq!(snapshot.num_rows(), 1);
    assert_eq!(snapshot.id(), "rooms");
}

/// Concurrent queries against a shared store all see the same rows.
#[test]
fn test_concurrent_queries() {
    let store = Arc::new(DatasetStore::new());
    store
        .add_dataset(
            "rooms",
            DatasetKind::Rooms,
            (0..50).map(|i| room(&format!("R{}", i), i as f64)).collect(),
        )
        .unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let query = json!({
                    "WHERE": {"GT": {"rooms_seats": 24}},
                    "OPTIONS": {"COLUMNS": ["rooms_name"], "ORDER": "rooms_name"}
                });
                QueryEngine::new(store.as_ref())
                    .perform_query(&query)
                    .unwrap()
                    .into_rows()
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results[0].len(), 25);
    assert!(results.iter().all(|r| *r == results[0]));
}
