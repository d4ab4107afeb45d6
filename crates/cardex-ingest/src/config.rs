//! Runtime configuration for one ingestion run

use cardex_scryfall::{Allowlist, BulkKind, Denylist, FilterChain, NonDigital, NonPreview};
use cardex_store::DEFAULT_BATCH_SIZE;
use chrono::NaiveDate;

/// What to ingest and how strictly. Built by the CLI from the config file.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Load and write rulings
    pub process_rulings: bool,
    /// Stop after this many sets pass the other filters
    pub max_sets: Option<usize>,
    /// Only these set codes (empty = all)
    pub set_codes: Vec<String>,
    pub denied_set_codes: Vec<String>,
    pub denied_set_types: Vec<String>,
    pub include_digital: bool,
    pub include_previews: bool,
    /// Fail the set stage when the set listing was cut short
    pub strict_paging: bool,
    /// Card export to stream (`all_cards`, `default_cards`, ...)
    pub card_bulk: BulkKind,
    /// Documents per write batch
    pub batch_size: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            process_rulings: true,
            max_sets: None,
            set_codes: Vec::new(),
            denied_set_codes: Vec::new(),
            denied_set_types: Vec::new(),
            include_digital: false,
            include_previews: false,
            strict_paging: false,
            card_bulk: BulkKind::AllCards,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl IngestConfig {
    /// Filter chain for one enumeration of the set list.
    ///
    /// A fresh chain is needed per run since the count cap is stateful.
    pub fn filter_chain(&self, today: NaiveDate) -> FilterChain {
        let mut chain = FilterChain::new();
        if !self.include_digital {
            chain = chain.with(NonDigital);
        }
        if !self.include_previews {
            chain = chain.with(NonPreview { today });
        }
        if !self.denied_set_codes.is_empty() || !self.denied_set_types.is_empty() {
            chain = chain.with(Denylist::new(&self.denied_set_codes, &self.denied_set_types));
        }
        if !self.set_codes.is_empty() {
            chain = chain.with(Allowlist::new(&self.set_codes));
        }
        if let Some(max) = self.max_sets {
            chain = chain.with_cap(max);
        }
        chain
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.card_bulk.is_cards(),
            "'{}' is not a card export",
            self.card_bulk
        );
        anyhow::ensure!(self.batch_size > 0, "batch_size must be positive");
        Ok(())
    }
}
