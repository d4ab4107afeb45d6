//! cardex index - aggregates and search indices built during ingestion
//!
//! Aggregators are fed by one sequential producer and are not meant to be
//! shared; the pipeline creates fresh ones for every run.

pub mod artist;
pub mod normalize;
pub mod rulings;
pub mod trigram;

pub use artist::{ArtistAggregate, ArtistAggregator, ArtistCredit, artist_credits};
pub use normalize::Normalization;
pub use rulings::{RulingAggregate, RulingEntry, RulingsAggregator, aggregate_by_oracle_id};
pub use trigram::{TrigramAggregator, TrigramEntry, TrigramIndex};
