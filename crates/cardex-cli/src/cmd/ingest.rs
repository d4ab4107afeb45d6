//! `cardex ingest` - run the full pipeline

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use cardex_core::SharedProgress;
use cardex_store::{DocumentStore, FsStore, MemoryStore, Writer};
use clap::Args;

use crate::config::Config;

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Store root (overrides [store] root)
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Keep documents in memory and discard them at exit
    #[arg(long)]
    pub dry_run: bool,

    /// Parallel document writes (overrides [workers] writers)
    #[arg(short, long)]
    pub writers: Option<usize>,
}

pub fn run(args: IngestArgs, config: &Config, progress: &SharedProgress) -> Result<()> {
    let ingest = config.ingest_config()?;
    let client = super::client(config)?;

    let store: Arc<dyn DocumentStore> = if args.dry_run {
        log::info!("Dry run: documents stay in memory");
        Arc::new(MemoryStore::new())
    } else {
        let root = args.store.unwrap_or_else(|| config.store.root.clone());
        log::info!("Writing documents under {}", root.display());
        Arc::new(
            FsStore::open(&root)
                .with_context(|| format!("Cannot open store at {}", root.display()))?,
        )
    };
    let writer = Writer::new(store, args.writers.unwrap_or(config.workers.writers))?;

    let summary = cardex_ingest::run(&ingest, &client, &writer, progress)?;
    log::info!(
        "Ingestion complete: {} documents written",
        cardex_core::fmt_num(summary.documents_written())
    );
    Ok(())
}
