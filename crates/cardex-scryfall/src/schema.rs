//! Typed catalog records.
//!
//! Only the fields the pipeline consumes are declared; everything else in the
//! payload is ignored. Required fields missing from a record fail that
//! record's decode at the ingestion boundary.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A set (expansion, promo product, token set, ...).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RemoteSet {
    pub id: String,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub set_type: String,
    #[serde(default)]
    pub digital: bool,
    #[serde(default)]
    pub parent_set_code: Option<String>,
    #[serde(default)]
    pub block_code: Option<String>,
    #[serde(default)]
    pub block: Option<String>,
    #[serde(default)]
    pub released_at: Option<NaiveDate>,
    #[serde(default)]
    pub card_count: u32,
    #[serde(default)]
    pub icon_svg_uri: Option<String>,
}

impl RemoteSet {
    /// Parent set code, if present and non-blank.
    pub fn parent_code(&self) -> Option<&str> {
        self.parent_set_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// One face of a multi-faced card.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CardFace {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub artist_id: Option<String>,
}

/// A single printing of a card.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RemoteCard {
    pub id: String,
    #[serde(default)]
    pub oracle_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub lang: String,
    /// Set code
    pub set: String,
    /// Read but never written out; stored cards carry the catalog's set id
    #[serde(default, skip_serializing)]
    pub set_id: Option<String>,
    #[serde(default)]
    pub collector_number: String,
    #[serde(default)]
    pub rarity: Option<String>,
    #[serde(default)]
    pub released_at: Option<NaiveDate>,
    /// Display credit, `"A & B"` for collaborations
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub artist_ids: Vec<String>,
    #[serde(default)]
    pub card_faces: Vec<CardFace>,
}

/// A rules ruling attached to every printing sharing an oracle id.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RemoteRuling {
    pub oracle_id: String,
    #[serde(default)]
    pub source: String,
    pub published_at: NaiveDate,
    #[serde(default)]
    pub comment: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_set() {
        let json = r#"{
            "object": "set",
            "id": "2ec77b94-6d47-4891-a480-5d0b4e5c9372",
            "code": "pmkm",
            "name": "Murders at Karlov Manor Promos",
            "set_type": "promo",
            "released_at": "2024-02-09",
            "card_count": 132,
            "digital": false,
            "parent_set_code": "mkm",
            "icon_svg_uri": "https://svgs.scryfall.io/sets/mkm.svg"
        }"#;
        let set: RemoteSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.code, "pmkm");
        assert_eq!(set.parent_code(), Some("mkm"));
        assert_eq!(set.released_at, NaiveDate::from_ymd_opt(2024, 2, 9));
        assert!(!set.digital);
    }

    #[test]
    fn blank_parent_code_is_none() {
        let json = r#"{"id": "x", "code": "abc", "name": "ABC", "parent_set_code": "  "}"#;
        let set: RemoteSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.parent_code(), None);
    }

    #[test]
    fn set_missing_code_fails() {
        let json = r#"{"id": "x", "name": "ABC"}"#;
        assert!(serde_json::from_str::<RemoteSet>(json).is_err());
    }

    #[test]
    fn parse_card_with_faces() {
        let json = r#"{
            "id": "c1",
            "oracle_id": "o1",
            "name": "Delver of Secrets // Insectile Aberration",
            "lang": "en",
            "set": "isd",
            "collector_number": "51",
            "artist": "Matt Stewart",
            "artist_ids": ["a1"],
            "card_faces": [
                {"name": "Delver of Secrets", "artist": "Matt Stewart", "artist_id": "a1"},
                {"name": "Insectile Aberration", "artist": "Matt Stewart", "artist_id": "a1"}
            ],
            "prices": {"usd": "0.10"}
        }"#;
        let card: RemoteCard = serde_json::from_str(json).unwrap();
        assert_eq!(card.card_faces.len(), 2);
        assert_eq!(card.artist_ids, vec!["a1"]);
        assert_eq!(card.set, "isd");
    }

    #[test]
    fn card_set_id_is_not_serialized() {
        let json = r#"{"id": "c1", "name": "Shock", "set": "m19", "set_id": "remote"}"#;
        let card: RemoteCard = serde_json::from_str(json).unwrap();
        assert_eq!(card.set_id.as_deref(), Some("remote"));
        let value = serde_json::to_value(&card).unwrap();
        assert!(value.get("set_id").is_none());
    }

    #[test]
    fn parse_ruling() {
        let json = r#"{
            "object": "ruling",
            "oracle_id": "o1",
            "source": "wotc",
            "published_at": "2004-10-04",
            "comment": "Damage is dealt simultaneously."
        }"#;
        let ruling: RemoteRuling = serde_json::from_str(json).unwrap();
        assert_eq!(ruling.source, "wotc");
        assert_eq!(ruling.published_at, NaiveDate::from_ymd_opt(2004, 10, 4).unwrap());
    }
}
