//! Bulk export catalog types

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Known bulk export types
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkKind {
    AllCards,
    DefaultCards,
    OracleCards,
    UniqueArtwork,
    Rulings,
}

impl BulkKind {
    /// Parse config string into enum
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "all_cards" => Some(Self::AllCards),
            "default_cards" => Some(Self::DefaultCards),
            "oracle_cards" => Some(Self::OracleCards),
            "unique_artwork" => Some(Self::UniqueArtwork),
            "rulings" => Some(Self::Rulings),
            _ => None,
        }
    }

    /// `type` value in the bulk catalog
    pub fn type_name(self) -> &'static str {
        match self {
            Self::AllCards => "all_cards",
            Self::DefaultCards => "default_cards",
            Self::OracleCards => "oracle_cards",
            Self::UniqueArtwork => "unique_artwork",
            Self::Rulings => "rulings",
        }
    }

    /// Whether the export holds card objects
    pub fn is_cards(self) -> bool {
        !matches!(self, Self::Rulings)
    }
}

impl fmt::Display for BulkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// One entry of the bulk export catalog.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BulkMetadata {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub name: Option<String>,
    pub download_uri: String,
    /// Declared size in bytes
    #[serde(default)]
    pub size: u64,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub content_encoding: Option<String>,
}

impl BulkMetadata {
    pub fn is(&self, kind: BulkKind) -> bool {
        self.kind == kind.type_name()
    }

    /// Catalog says the download is gzip encoded.
    pub fn declares_gzip(&self) -> bool {
        self.content_encoding
            .as_deref()
            .is_some_and(|e| e.eq_ignore_ascii_case("gzip"))
    }
}

/// The catalog endpoint answers with a list envelope; a bare array is accepted too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogResponse {
    List { data: Vec<BulkMetadata> },
    Bare(Vec<BulkMetadata>),
}

/// Parse a bulk catalog response body.
pub fn parse_catalog(reader: impl std::io::Read) -> Result<Vec<BulkMetadata>, serde_json::Error> {
    let response: CatalogResponse = serde_json::from_reader(reader)?;
    Ok(match response {
        CatalogResponse::List { data } => data,
        CatalogResponse::Bare(entries) => entries,
    })
}

/// First catalog entry of the requested type.
pub fn select_bulk(catalog: &[BulkMetadata], kind: BulkKind) -> Option<&BulkMetadata> {
    catalog.iter().find(|m| m.is(kind))
}
