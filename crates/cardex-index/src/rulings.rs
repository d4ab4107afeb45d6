//! Rulings grouped by oracle id

use std::collections::BTreeMap;

use cardex_scryfall::RemoteRuling;
use chrono::NaiveDate;
use serde::Serialize;

/// A ruling without its oracle id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RulingEntry {
    pub source: String,
    pub published_at: NaiveDate,
    pub comment: String,
}

impl From<RemoteRuling> for RulingEntry {
    fn from(r: RemoteRuling) -> Self {
        Self {
            source: r.source,
            published_at: r.published_at,
            comment: r.comment,
        }
    }
}

/// All rulings for one oracle id, in input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RulingAggregate {
    pub oracle_id: String,
    pub rulings: Vec<RulingEntry>,
}

/// Group a flat ruling sequence by oracle id, keeping input order per group.
pub fn aggregate_by_oracle_id(
    rulings: impl IntoIterator<Item = RemoteRuling>,
) -> BTreeMap<String, Vec<RulingEntry>> {
    let mut agg = RulingsAggregator::new();
    for r in rulings {
        agg.track(r);
    }
    agg.groups
}

/// Incremental form of [`aggregate_by_oracle_id`] for streaming input.
#[derive(Debug, Default)]
pub struct RulingsAggregator {
    groups: BTreeMap<String, Vec<RulingEntry>>,
    tracked: usize,
}

impl RulingsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, ruling: RemoteRuling) {
        self.tracked += 1;
        // Avoid cloning the key when the group exists
        if let Some(group) = self.groups.get_mut(&ruling.oracle_id) {
            group.push(ruling.into());
        } else {
            let oracle_id = ruling.oracle_id.clone();
            self.groups.insert(oracle_id, vec![ruling.into()]);
        }
    }

    /// Rulings tracked
    pub fn tracked(&self) -> usize {
        self.tracked
    }

    /// Distinct oracle ids
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn clear(&mut self) {
        self.groups.clear();
        self.tracked = 0;
    }

    /// Aggregates ordered by oracle id.
    pub fn finish(self) -> Vec<RulingAggregate> {
        self.groups
            .into_iter()
            .map(|(oracle_id, rulings)| RulingAggregate { oracle_id, rulings })
            .collect()
    }
}
