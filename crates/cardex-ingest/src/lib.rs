//! cardex ingest - the bulk ingestion pipeline
//!
//! Stages run strictly in order: the set listing builds the [`SetCatalog`],
//! the rulings export is grouped by oracle id, the card export feeds the
//! set-card documents and both aggregators, and the finished aggregates are
//! written last. Aggregators live for one [`run`] only.

pub mod catalog;
pub mod config;
pub mod documents;
pub mod loader;
pub mod runner;
pub mod stage;
pub mod summary;

pub use catalog::{SetCatalog, SetRef};
pub use config::IngestConfig;
pub use loader::LoadStats;
pub use runner::{Pipeline, run};
pub use stage::{Artifact, PipelineState, Stage, StageStatus};
pub use summary::{RunSummary, StageReport};
