//! Mapping of records and aggregates to store documents.
//!
//! | kind            | partition key | id       |
//! |-----------------|---------------|----------|
//! | set             | set code      | set id   |
//! | set-association | parent code   | set id   |
//! | set-card        | set code      | card id  |
//! | artist          | artist id     | artist id|
//! | ruling          | oracle id     | oracle id|
//! | *-trigram       | trigram       | trigram, then `trigram~n` per extra chunk |

use cardex_index::{ArtistAggregate, RulingAggregate, TrigramEntry};
use cardex_scryfall::{RemoteCard, RemoteSet};
use cardex_store::{Document, DocumentKind, StoreError};
use serde::Serialize;

use crate::catalog::SetRef;

/// Link from a child set to its parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetAssociation<'a> {
    pub set_id: &'a str,
    pub parent_set_code: &'a str,
    pub set_code: &'a str,
    pub set_name: &'a str,
}

impl<'a> SetAssociation<'a> {
    /// `None` unless the set names a non-blank parent.
    pub fn of(set: &'a RemoteSet) -> Option<Self> {
        set.parent_code().map(|parent| Self {
            set_id: &set.id,
            parent_set_code: parent,
            set_code: &set.code,
            set_name: &set.name,
        })
    }
}

#[derive(Serialize)]
struct SetCardBody<'a> {
    set_id: &'a str,
    set_name: &'a str,
    #[serde(flatten)]
    card: &'a RemoteCard,
}

/// Entries per trigram document. Longer posting lists are split.
pub const TRIGRAM_CHUNK_ENTRIES: usize = 2048;

#[derive(Serialize)]
struct TrigramBody<'a> {
    trigram: &'a str,
    chunk: usize,
    chunks: usize,
    entries: &'a [TrigramEntry],
}

pub fn set_document(set: &RemoteSet) -> Result<Document, StoreError> {
    Document::new(DocumentKind::Set, set.code.as_str(), set.id.as_str(), set)
}

pub fn set_association_document(assoc: &SetAssociation<'_>) -> Result<Document, StoreError> {
    Document::new(
        DocumentKind::SetAssociation,
        assoc.parent_set_code,
        assoc.set_id,
        assoc,
    )
}

pub fn set_card_document(set: &SetRef, card: &RemoteCard) -> Result<Document, StoreError> {
    let body = SetCardBody {
        set_id: &set.id,
        set_name: &set.name,
        card,
    };
    Document::new(DocumentKind::SetCard, set.code.as_str(), card.id.as_str(), &body)
}

pub fn artist_document(artist: &ArtistAggregate) -> Result<Document, StoreError> {
    Document::new(
        DocumentKind::Artist,
        artist.artist_id.as_str(),
        artist.artist_id.as_str(),
        artist,
    )
}

pub fn ruling_document(group: &RulingAggregate) -> Result<Document, StoreError> {
    Document::new(
        DocumentKind::Ruling,
        group.oracle_id.as_str(),
        group.oracle_id.as_str(),
        group,
    )
}

/// Documents for one trigram, at most [`TRIGRAM_CHUNK_ENTRIES`] entries each.
///
/// Every chunk shares the trigram as partition key. The first chunk's id is
/// the trigram itself.
pub fn trigram_documents(
    kind: DocumentKind,
    trigram: &str,
    entries: &[TrigramEntry],
) -> Result<Vec<Document>, StoreError> {
    let chunks = entries.len().div_ceil(TRIGRAM_CHUNK_ENTRIES).max(1);
    let mut docs = Vec::with_capacity(chunks);
    for chunk in 0..chunks {
        let start = chunk * TRIGRAM_CHUNK_ENTRIES;
        let end = (start + TRIGRAM_CHUNK_ENTRIES).min(entries.len());
        let id = match chunk {
            0 => trigram.to_string(),
            n => format!("{trigram}~{n}"),
        };
        let body = TrigramBody {
            trigram,
            chunk,
            chunks,
            entries: &entries[start..end],
        };
        docs.push(Document::new(kind, trigram, id.as_str(), &body)?);
    }
    Ok(docs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(code: &str, parent: Option<&str>) -> RemoteSet {
        RemoteSet {
            id: format!("id-{code}"),
            code: code.to_string(),
            name: format!("Set {code}"),
            set_type: "promo".to_string(),
            digital: false,
            parent_set_code: parent.map(str::to_string),
            block_code: None,
            block: None,
            released_at: None,
            card_count: 0,
            icon_svg_uri: None,
        }
    }

    #[test]
    fn association_only_with_parent() {
        assert!(SetAssociation::of(&set("plea", None)).is_none());
        assert!(SetAssociation::of(&set("plea", Some("  "))).is_none());

        let child = set("plea", Some("lea"));
        let assoc = SetAssociation::of(&child).unwrap();
        let doc = set_association_document(&assoc).unwrap();
        assert_eq!(doc.kind, DocumentKind::SetAssociation);
        assert_eq!(doc.partition_key, "lea");
        assert_eq!(doc.id, "id-plea");
        assert_eq!(doc.body["set_code"], "plea");
    }

    #[test]
    fn set_card_is_partitioned_by_set_code() {
        let card = RemoteCard {
            id: "c1".into(),
            oracle_id: Some("o1".into()),
            name: "Black Lotus".into(),
            lang: "en".into(),
            set: "lea".into(),
            set_id: None,
            collector_number: "232".into(),
            rarity: Some("rare".into()),
            released_at: None,
            artist: Some("Christopher Rush".into()),
            artist_ids: vec!["a1".into()],
            card_faces: Vec::new(),
        };
        let set_ref = SetRef {
            id: "s1".into(),
            code: "lea".into(),
            name: "Limited Edition Alpha".into(),
        };
        let doc = set_card_document(&set_ref, &card).unwrap();
        assert_eq!(doc.partition_key, "lea");
        assert_eq!(doc.id, "c1");
        assert_eq!(doc.body["set_id"], "s1");
        assert_eq!(doc.body["name"], "Black Lotus");

        // A set id on the card record never shadows the catalog's
        let stale = RemoteCard {
            set_id: Some("other".into()),
            ..card
        };
        let doc = set_card_document(&set_ref, &stale).unwrap();
        assert_eq!(doc.body["set_id"], "s1");
        assert_eq!(doc.body["set_name"], "Limited Edition Alpha");
    }

    fn entry(n: usize) -> TrigramEntry {
        TrigramEntry {
            trigram: "the".into(),
            entity_id: format!("c{n}"),
            display_name: "The Abyss".into(),
            normalized_name: "the abyss".into(),
            positions: vec![0],
        }
    }

    #[test]
    fn small_trigram_is_one_document() {
        let docs =
            trigram_documents(DocumentKind::CardTrigram, "the", &[entry(1), entry(2)]).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "the");
        assert_eq!(docs[0].body["entries"].as_array().unwrap().len(), 2);
        assert_eq!(docs[0].body["chunks"], 1);
    }

    #[test]
    fn long_posting_list_is_chunked() {
        let entries: Vec<_> = (0..TRIGRAM_CHUNK_ENTRIES * 2 + 1).map(entry).collect();
        let docs = trigram_documents(DocumentKind::CardTrigram, "the", &entries).unwrap();

        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["the", "the~1", "the~2"]);
        assert!(docs.iter().all(|d| d.partition_key == "the"));
        let sizes: Vec<usize> = docs
            .iter()
            .map(|d| d.body["entries"].as_array().unwrap().len())
            .collect();
        assert_eq!(sizes, vec![TRIGRAM_CHUNK_ENTRIES, TRIGRAM_CHUNK_ENTRIES, 1]);
        assert_eq!(docs[2].body["entries"][0]["entity_id"], format!("c{}", TRIGRAM_CHUNK_ENTRIES * 2));
    }
}
