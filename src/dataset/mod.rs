//! Dataset subsystem
//!
//! Holds the record model and the in-memory store that owns loaded
//! datasets. Ingestion (archive parsing, HTML extraction, geocoding) is
//! outside this crate; producers hand over flat records tagged with an
//! id and a kind.

mod errors;
mod record;
mod store;

pub use errors::{DatasetError, DatasetResult};
pub use record::{FieldValue, Record, ValueKey};
pub use store::{validate_id, Dataset, DatasetStore, DatasetSummary};
