//! Document envelope written to the store

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Aggregate type of a stored document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentKind {
    Artist,
    Ruling,
    Set,
    SetAssociation,
    SetCard,
    CardTrigram,
    ArtistTrigram,
}

impl DocumentKind {
    /// Directory / collection name
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Artist => "artist",
            Self::Ruling => "ruling",
            Self::Set => "set",
            Self::SetAssociation => "set-association",
            Self::SetCard => "set-card",
            Self::CardTrigram => "card-trigram",
            Self::ArtistTrigram => "artist-trigram",
        }
    }

    pub fn all() -> &'static [DocumentKind] {
        &[
            Self::Artist,
            Self::Ruling,
            Self::Set,
            Self::SetAssociation,
            Self::SetCard,
            Self::CardTrigram,
            Self::ArtistTrigram,
        ]
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// One upsert unit: kind + partition key + id identify it, `body` replaces
/// whatever was stored under that identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub kind: DocumentKind,
    pub partition_key: String,
    pub id: String,
    pub body: serde_json::Value,
}

impl Document {
    pub fn new<T: Serialize>(
        kind: DocumentKind,
        partition_key: impl Into<String>,
        id: impl Into<String>,
        body: &T,
    ) -> Result<Self, StoreError> {
        let id = id.into();
        let body = serde_json::to_value(body).map_err(|e| StoreError::Serialize {
            id: id.clone(),
            source: e,
        })?;
        Ok(Self {
            kind,
            partition_key: partition_key.into(),
            id,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Body {
        name: &'static str,
    }

    #[test]
    fn new_serializes_body() {
        let doc = Document::new(DocumentKind::Set, "lea", "s1", &Body { name: "Alpha" }).unwrap();
        assert_eq!(doc.body["name"], "Alpha");
        assert_eq!(doc.partition_key, "lea");
    }

    #[test]
    fn kind_serde_matches_dir_name() {
        for kind in DocumentKind::all() {
            let json = serde_json::to_string(kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.dir_name()));
        }
    }
}
