//! In-memory dataset store
//!
//! Datasets are immutable once built and shared as `Arc<Dataset>`.
//! Add and remove swap whole entries under a write lock, so a query that
//! already holds a snapshot never observes a partial change.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;

use crate::catalog::DatasetKind;
use crate::executor::DatasetSource;
use crate::observability::{log_event_with_fields, Event};

use super::errors::{DatasetError, DatasetResult};
use super::record::Record;

/// An immutable, validated collection of records
#[derive(Debug, Clone)]
pub struct Dataset {
    id: String,
    kind: DatasetKind,
    records: Vec<Record>,
}

impl Dataset {
    /// Builds a dataset, checking the id and every record against the kind.
    pub fn new(id: impl Into<String>, kind: DatasetKind, records: Vec<Record>) -> DatasetResult<Self> {
        let id = id.into();
        validate_id(&id)?;
        for (index, record) in records.iter().enumerate() {
            record.conforms_to(kind).map_err(|e| match e {
                DatasetError::InvalidRecord(reason) => {
                    DatasetError::InvalidRecord(format!("record {}: {}", index, reason))
                }
                other => other,
            })?;
        }
        Ok(Self { id, kind, records })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> DatasetKind {
        self.kind
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn num_rows(&self) -> usize {
        self.records.len()
    }

    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary {
            id: self.id.clone(),
            kind: self.kind,
            num_rows: self.num_rows(),
        }
    }
}

/// Listing entry for a loaded dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetSummary {
    pub id: String,
    pub kind: DatasetKind,
    #[serde(rename = "numRows")]
    pub num_rows: usize,
}

/// Checks a dataset id: non-empty, not only whitespace, no underscore.
pub fn validate_id(id: &str) -> DatasetResult<()> {
    if id.trim().is_empty() || id.contains('_') {
        return Err(DatasetError::InvalidId(id.to_string()));
    }
    Ok(())
}

/// Thread-safe registry of loaded datasets
#[derive(Debug, Default)]
pub struct DatasetStore {
    datasets: RwLock<BTreeMap<String, Arc<Dataset>>>,
}

impl DatasetStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a dataset built from records.
    ///
    /// Returns the ids of every loaded dataset after the insertion.
    pub fn add_dataset(
        &self,
        id: &str,
        kind: DatasetKind,
        records: Vec<Record>,
    ) -> DatasetResult<Vec<String>> {
        validate_id(id)?;
        if self.contains(id) {
            return Err(DatasetError::AlreadyExists(id.to_string()));
        }
        let dataset = Dataset::new(id, kind, records)?;
        self.insert(dataset)
    }

    /// Inserts an already-built dataset.
    pub fn insert(&self, dataset: Dataset) -> DatasetResult<Vec<String>> {
        let rows = dataset.num_rows().to_string();
        let kind = dataset.kind();
        let id = dataset.id().to_string();

        let mut datasets = self.datasets.write().unwrap_or_else(PoisonError::into_inner);
        if datasets.contains_key(&id) {
            return Err(DatasetError::AlreadyExists(id));
        }
        datasets.insert(id.clone(), Arc::new(dataset));
        let ids = datasets.keys().cloned().collect();
        drop(datasets);

        log_event_with_fields(
            Event::DatasetAdded,
            &[("dataset", &id), ("kind", kind.as_str()), ("rows", &rows)],
        );
        Ok(ids)
    }

    /// Removes a dataset, returning its id.
    pub fn remove_dataset(&self, id: &str) -> DatasetResult<String> {
        validate_id(id)?;
        let removed = self
            .datasets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);

        match removed {
            Some(_) => {
                log_event_with_fields(Event::DatasetRemoved, &[("dataset", id)]);
                Ok(id.to_string())
            }
            None => Err(DatasetError::NotFound(id.to_string())),
        }
    }

    /// Lists loaded datasets ordered by id
    pub fn list_datasets(&self) -> Vec<DatasetSummary> {
        self.datasets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|d| d.summary())
            .collect()
    }

    /// Returns a snapshot of one dataset
    pub fn get(&self, id: &str) -> Option<Arc<Dataset>> {
        self.datasets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.datasets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.datasets.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DatasetSource for DatasetStore {
    fn dataset(&self, id: &str) -> Option<Arc<Dataset>> {
        self.get(id)
    }
}
