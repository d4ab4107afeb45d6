//! cardex Scryfall - catalog API source
//!
//! Typed records for sets, cards and rulings, the API client (set listing,
//! bulk export catalog and downloads) and the set filter chain.

pub mod api;
pub mod bulk;
pub mod filter;
pub mod schema;

// Re-exports
pub use api::{DEFAULT_BASE_URL, ScryfallClient};
pub use bulk::{BulkKind, BulkMetadata};
pub use filter::{Allowlist, Denylist, FilterChain, MaxCount, NonDigital, NonPreview, SetFilter};
pub use schema::{CardFace, RemoteCard, RemoteRuling, RemoteSet};
