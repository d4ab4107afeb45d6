//! Per-artist aggregation of names, cards and sets.
//!
//! Keyed by artist id only. One id can carry several historical display
//! names and one name can belong to several ids; neither is collapsed.

use std::collections::BTreeSet;

use cardex_scryfall::RemoteCard;
use rustc_hash::FxHashMap;
use serde::Serialize;

/// Everything seen for one artist id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtistAggregate {
    pub artist_id: String,
    pub names: BTreeSet<String>,
    pub card_ids: BTreeSet<String>,
    pub set_ids: BTreeSet<String>,
}

impl ArtistAggregate {
    fn new(artist_id: &str) -> Self {
        Self {
            artist_id: artist_id.to_string(),
            names: BTreeSet::new(),
            card_ids: BTreeSet::new(),
            set_ids: BTreeSet::new(),
        }
    }
}

/// One (artist id, display name) pairing on a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtistCredit<'a> {
    pub artist_id: &'a str,
    /// Empty when the card carries no credit text
    pub name: &'a str,
}

/// Artist credits of a card.
///
/// Face-level credits win when present. Otherwise the top-level id list is
/// zipped with the credit text split on `" & "`; if the counts disagree every
/// id gets the full credit text.
pub fn artist_credits(card: &RemoteCard) -> Vec<ArtistCredit<'_>> {
    let mut credits: Vec<ArtistCredit<'_>> = Vec::new();
    for face in &card.card_faces {
        if let Some(id) = face.artist_id.as_deref().filter(|id| !id.is_empty()) {
            let credit = ArtistCredit {
                artist_id: id,
                name: face.artist.as_deref().unwrap_or("").trim(),
            };
            if !credits.contains(&credit) {
                credits.push(credit);
            }
        }
    }
    if !credits.is_empty() {
        return credits;
    }

    let text = card.artist.as_deref().unwrap_or("").trim();
    let names: Vec<&str> = text.split(" & ").map(str::trim).collect();
    let zip = names.len() == card.artist_ids.len();
    for (i, id) in card.artist_ids.iter().enumerate().filter(|(_, id)| !id.is_empty()) {
        let name = if zip { names[i] } else { text };
        credits.push(ArtistCredit {
            artist_id: id,
            name,
        });
    }
    credits
}

/// Accumulates [`ArtistAggregate`]s across cards.
#[derive(Debug, Default)]
pub struct ArtistAggregator {
    artists: FxHashMap<String, ArtistAggregate>,
    cards_without_artist: usize,
}

impl ArtistAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one card's credits. Returns the number of artists touched.
    pub fn track(&mut self, card: &RemoteCard, set_id: &str) -> usize {
        let credits = artist_credits(card);
        if credits.is_empty() {
            self.cards_without_artist += 1;
            return 0;
        }
        for credit in &credits {
            let agg = self
                .artists
                .entry(credit.artist_id.to_string())
                .or_insert_with(|| ArtistAggregate::new(credit.artist_id));
            if !credit.name.is_empty() {
                agg.names.insert(credit.name.to_string());
            }
            agg.card_ids.insert(card.id.clone());
            if !set_id.is_empty() {
                agg.set_ids.insert(set_id.to_string());
            }
        }
        credits.len()
    }

    pub fn len(&self) -> usize {
        self.artists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artists.is_empty()
    }

    /// Cards tracked that carried no artist id
    pub fn cards_without_artist(&self) -> usize {
        self.cards_without_artist
    }

    pub fn clear(&mut self) {
        self.artists.clear();
        self.cards_without_artist = 0;
    }

    /// Aggregates ordered by artist id.
    pub fn finish(self) -> Vec<ArtistAggregate> {
        let mut artists: Vec<ArtistAggregate> = self.artists.into_values().collect();
        artists.sort_unstable_by(|a, b| a.artist_id.cmp(&b.artist_id));
        artists
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardex_scryfall::CardFace;

    fn card(id: &str, artist: &str, ids: &[&str]) -> RemoteCard {
        RemoteCard {
            id: id.to_string(),
            oracle_id: None,
            name: format!("Card {id}"),
            lang: "en".to_string(),
            set: "tst".to_string(),
            set_id: None,
            collector_number: "1".to_string(),
            rarity: None,
            released_at: None,
            artist: Some(artist.to_string()),
            artist_ids: ids.iter().map(|s| s.to_string()).collect(),
            card_faces: Vec::new(),
        }
    }

    #[test]
    fn same_id_different_names_merge() {
        let mut agg = ArtistAggregator::new();
        agg.track(&card("c1", "Jesper Myrfors", &["a1"]), "s1");
        agg.track(&card("c2", "Jesper Myrfor", &["a1"]), "s2");
        let artists = agg.finish();

        assert_eq!(artists.len(), 1);
        assert_eq!(artists[0].names.len(), 2);
        assert_eq!(artists[0].card_ids.len(), 2);
        assert_eq!(artists[0].set_ids.len(), 2);
    }

    #[test]
    fn same_name_different_ids_stay_apart() {
        let mut agg = ArtistAggregator::new();
        agg.track(&card("c1", "John Avon", &["a1"]), "s1");
        agg.track(&card("c2", "John Avon", &["a2"]), "s1");
        assert_eq!(agg.len(), 2);
    }

    #[test]
    fn collaboration_zips_names() {
        let c = card("c1", "Zoltan Boros & Gabor Szikszai", &["a1", "a2"]);
        let credits = artist_credits(&c);
        assert_eq!(
            credits,
            vec![
                ArtistCredit { artist_id: "a1", name: "Zoltan Boros" },
                ArtistCredit { artist_id: "a2", name: "Gabor Szikszai" },
            ]
        );
    }

    #[test]
    fn mismatched_counts_use_full_credit() {
        let c = card("c1", "Artist One & Artist Two", &["a1"]);
        let credits = artist_credits(&c);
        assert_eq!(credits[0].name, "Artist One & Artist Two");
    }

    #[test]
    fn face_credits_take_precedence() {
        let mut c = card("c1", "Front Artist & Back Artist", &["a1", "a2"]);
        c.card_faces = vec![
            CardFace {
                name: "Front".into(),
                artist: Some("Front Artist".into()),
                artist_id: Some("a1".into()),
            },
            CardFace {
                name: "Back".into(),
                artist: Some("Back Artist".into()),
                artist_id: Some("a3".into()),
            },
        ];
        let ids: Vec<&str> = artist_credits(&c).iter().map(|c| c.artist_id).collect();
        assert_eq!(ids, vec!["a1", "a3"]);
    }

    #[test]
    fn retracking_is_idempotent() {
        let mut agg = ArtistAggregator::new();
        let c = card("c1", "Rebecca Guay", &["a1"]);
        agg.track(&c, "s1");
        let once = agg.artists.clone();
        agg.track(&c, "s1");
        assert_eq!(agg.artists, once);
    }

    #[test]
    fn card_without_ids_counted() {
        let mut agg = ArtistAggregator::new();
        assert_eq!(agg.track(&card("c1", "Unknown", &[]), "s1"), 0);
        assert_eq!(agg.cards_without_artist(), 1);
        assert!(agg.is_empty());
    }
}
