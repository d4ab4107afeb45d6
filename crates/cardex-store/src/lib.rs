//! Document persistence for the cardex pipeline.
//!
//! Every aggregate becomes one [`Document`] keyed by kind, partition key and
//! id. [`Writer`] fans batches out over a rayon pool and reports per-item
//! failures instead of failing the whole batch.

pub mod buffer;
pub mod document;
pub mod error;
pub mod hash;
pub mod store;
pub mod writer;

pub use buffer::{DEFAULT_BATCH_SIZE, DocumentBuffer};
pub use document::{Document, DocumentKind};
pub use error::StoreError;
pub use store::{DocumentStore, FsStore, MemoryStore};
pub use writer::{WriteFailure, WriteReport, Writer};
