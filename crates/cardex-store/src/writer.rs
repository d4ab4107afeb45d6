//! Parallel fan-out of upserts with per-item results

use std::sync::Arc;

use anyhow::Context;
use rayon::prelude::*;

use crate::document::{Document, DocumentKind};
use crate::store::DocumentStore;

/// Failed ids logged per report
const LOGGED_FAILURES: usize = 5;

/// One upsert that did not land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteFailure {
    pub kind: DocumentKind,
    pub partition_key: String,
    pub id: String,
    pub error: String,
}

/// Outcome of a batch of upserts. Every attempted document is either counted
/// in `written` or listed in `failures`.
#[derive(Debug, Default, Clone)]
pub struct WriteReport {
    pub attempted: usize,
    pub written: usize,
    pub failures: Vec<WriteFailure>,
}

impl WriteReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn merge(&mut self, other: WriteReport) {
        self.attempted += other.attempted;
        self.written += other.written;
        self.failures.extend(other.failures);
    }

    /// Log the first few failures at error level.
    pub fn log_failures(&self, label: &str) {
        if self.failures.is_empty() {
            return;
        }
        log::error!(
            "{label}: {}/{} writes failed",
            self.failures.len(),
            self.attempted
        );
        for f in self.failures.iter().take(LOGGED_FAILURES) {
            log::error!("  {} {}/{}: {}", f.kind, f.partition_key, f.id, f.error);
        }
        if self.failures.len() > LOGGED_FAILURES {
            log::error!("  ... and {} more", self.failures.len() - LOGGED_FAILURES);
        }
    }
}

/// Scatter/gather writer: every document of a batch is upserted on the pool
/// and the call returns once all of them finished.
pub struct Writer {
    store: Arc<dyn DocumentStore>,
    pool: rayon::ThreadPool,
}

impl std::fmt::Debug for Writer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Writer")
            .field("threads", &self.pool.current_num_threads())
            .finish_non_exhaustive()
    }
}

impl Writer {
    /// `workers == 0` lets rayon pick the thread count.
    pub fn new(store: Arc<dyn DocumentStore>, workers: usize) -> anyhow::Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("cardex-writer-{i}"))
            .build()
            .context("Failed to create writer thread pool")?;
        Ok(Self { store, pool })
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn write_all(&self, docs: Vec<Document>) -> WriteReport {
        let attempted = docs.len();
        let store = &self.store;
        let failures: Vec<WriteFailure> = self.pool.install(|| {
            docs.par_iter()
                .filter_map(|doc| {
                    store.upsert(doc).err().map(|e| WriteFailure {
                        kind: doc.kind,
                        partition_key: doc.partition_key.clone(),
                        id: doc.id.clone(),
                        error: e.to_string(),
                    })
                })
                .collect()
        });
        log::debug!(
            "wrote {}/{} documents",
            attempted - failures.len(),
            attempted
        );
        WriteReport {
            attempted,
            written: attempted - failures.len(),
            failures,
        }
    }
}
