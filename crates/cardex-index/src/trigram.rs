//! Trigram inverted index over entity names.
//!
//! A name is normalized, a 3-character window slides over it, and for each
//! distinct trigram one [`TrigramEntry`] records every position it occurs at.
//! The query side decomposes a search term the same way and intersects.

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::normalize::Normalization;

/// Characters per key
pub const TRIGRAM_LEN: usize = 3;

/// One (trigram, entity) posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrigramEntry {
    pub trigram: String,
    pub entity_id: String,
    pub display_name: String,
    pub normalized_name: String,
    /// Character offsets into `normalized_name`, ascending
    pub positions: Vec<usize>,
}

/// Builds a trigram index from tracked names.
///
/// Not deduplicating: tracking the same entity twice adds its entries twice.
#[derive(Debug)]
pub struct TrigramAggregator {
    normalization: Normalization,
    index: FxHashMap<String, Vec<TrigramEntry>>,
    tracked: usize,
}

impl TrigramAggregator {
    pub fn new(normalization: Normalization) -> Self {
        Self {
            normalization,
            index: FxHashMap::default(),
            tracked: 0,
        }
    }

    pub fn normalization(&self) -> Normalization {
        self.normalization
    }

    /// Index one name. Returns the number of entries added (distinct trigrams).
    pub fn track(&mut self, entity_id: &str, display_name: &str) -> usize {
        self.tracked += 1;
        let normalized = self.normalization.apply(display_name);
        let chars: Vec<char> = normalized.chars().collect();
        if chars.len() < TRIGRAM_LEN {
            return 0;
        }

        // Distinct trigrams in first-seen order, each with its positions
        let mut local: Vec<(String, Vec<usize>)> = Vec::new();
        let mut slot: FxHashMap<String, usize> = FxHashMap::default();
        for (pos, window) in chars.windows(TRIGRAM_LEN).enumerate() {
            let trigram: String = window.iter().collect();
            match slot.get(&trigram) {
                Some(&i) => local[i].1.push(pos),
                None => {
                    slot.insert(trigram.clone(), local.len());
                    local.push((trigram, vec![pos]));
                }
            }
        }

        let added = local.len();
        for (trigram, positions) in local {
            let entry = TrigramEntry {
                trigram: trigram.clone(),
                entity_id: entity_id.to_string(),
                display_name: display_name.to_string(),
                normalized_name: normalized.clone(),
                positions,
            };
            self.index.entry(trigram).or_default().push(entry);
        }
        added
    }

    /// Names tracked since creation or the last [`clear`](Self::clear)
    pub fn tracked(&self) -> usize {
        self.tracked
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.tracked = 0;
    }

    /// Hand over the finished index. Tracking is over once this is called.
    pub fn finish(self) -> TrigramIndex {
        log::debug!(
            "trigram index: {} names, {} trigrams",
            self.tracked,
            self.index.len()
        );
        TrigramIndex { index: self.index }
    }
}

/// Finished trigram index.
#[derive(Debug, Default)]
pub struct TrigramIndex {
    index: FxHashMap<String, Vec<TrigramEntry>>,
}

impl TrigramIndex {
    /// Distinct trigrams
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Total entries across all trigrams
    pub fn entry_count(&self) -> usize {
        self.index.values().map(Vec::len).sum()
    }

    pub fn get(&self, trigram: &str) -> &[TrigramEntry] {
        self.index.get(trigram).map_or(&[], Vec::as_slice)
    }

    /// (trigram, entries) pairs ordered by trigram.
    pub fn into_sorted(self) -> Vec<(String, Vec<TrigramEntry>)> {
        let mut pairs: Vec<_> = self.index.into_iter().collect();
        pairs.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        pairs
    }
}
