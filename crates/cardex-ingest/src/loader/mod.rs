//! Streaming loaders: one per source (set listing, rulings export, card export)

mod cards;
mod rulings;
mod sets;

pub use cards::{CardSinks, load_cards};
pub use rulings::load_rulings;
pub use sets::{SetLoad, load_sets};

use std::sync::atomic::Ordering;

use cardex_core::{ByteCounter, fmt_num, upgrade_to_bar};
use cardex_store::WriteReport;
use indicatif::ProgressBar;

/// Progress update interval (every N elements)
const UPDATE_INTERVAL: usize = 10_000;

/// Counters for one loader pass.
#[derive(Debug, Clone, Default)]
pub struct LoadStats {
    /// Elements read off the stream
    pub elements: usize,
    /// Elements decoded into typed records
    pub parsed: usize,
    pub parse_errors: usize,
    /// Parsed but not ingested (filtered set, unknown set code)
    pub skipped: usize,
    /// Documents handed to the writer
    pub documents: usize,
    pub writes: WriteReport,
}

/// Byte progress for a bulk download, refreshed every [`UPDATE_INTERVAL`]
/// elements.
struct ByteProgress<'a> {
    pb: &'a ProgressBar,
    counter: ByteCounter,
}

impl<'a> ByteProgress<'a> {
    fn new(pb: &'a ProgressBar, counter: ByteCounter, total: Option<u64>) -> Self {
        if let Some(total) = total {
            upgrade_to_bar(pb, total);
        }
        Self { pb, counter }
    }

    fn tick(&self, stats: &LoadStats) {
        if stats.elements > 0 && stats.elements % UPDATE_INTERVAL == 0 {
            self.pb.set_position(self.counter.load(Ordering::Relaxed));
            self.pb.set_message(format!(
                "{} parsed, {} skipped",
                fmt_num(stats.parsed),
                fmt_num(stats.skipped)
            ));
        }
    }
}
