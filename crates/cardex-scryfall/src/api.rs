//! Catalog API client

use std::sync::Arc;

use anyhow::Context;
use cardex_core::{Body, Paginator, RateLimiter, StreamError, Transport};

use crate::bulk::{BulkKind, BulkMetadata, parse_catalog, select_bulk};
use crate::schema::RemoteSet;

/// Public API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.scryfall.com";

/// Client for the catalog API. Every outbound call goes through `limiter`.
#[derive(Clone)]
pub struct ScryfallClient {
    transport: Arc<dyn Transport>,
    limiter: Arc<RateLimiter>,
    base_url: String,
}

impl std::fmt::Debug for ScryfallClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScryfallClient")
            .field("base_url", &self.base_url)
            .field("min_interval", &self.limiter.min_interval())
            .finish_non_exhaustive()
    }
}

impl ScryfallClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        limiter: Arc<RateLimiter>,
        base_url: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            transport,
            limiter,
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// All sets, lazily paged.
    pub fn sets(&self) -> Paginator<RemoteSet> {
        Paginator::new(
            self.transport.clone(),
            self.limiter.clone(),
            format!("{}/sets", self.base_url),
        )
    }

    /// Fetch the bulk export catalog.
    pub fn bulk_catalog(&self) -> anyhow::Result<Vec<BulkMetadata>> {
        let url = format!("{}/bulk-data", self.base_url);
        log::debug!("Fetching bulk catalog from {url}");

        let mut token = self.limiter.acquire();
        let body = self
            .transport
            .open(&url)
            .context("Failed to fetch bulk catalog")?;
        let catalog = parse_catalog(body.reader).context("Invalid bulk catalog JSON");
        token.release();

        let catalog = catalog?;
        log::debug!("Bulk catalog lists {} exports", catalog.len());
        Ok(catalog)
    }

    /// Locate the export of the given type.
    pub fn find_bulk(&self, kind: BulkKind) -> anyhow::Result<BulkMetadata> {
        let catalog = self.bulk_catalog()?;
        select_bulk(&catalog, kind)
            .cloned()
            .with_context(|| format!("No '{kind}' export in bulk catalog"))
    }

    /// Open a bulk export for streaming.
    ///
    /// The rate limiter covers the request; the body is read after release
    /// since export files are served from a separate host.
    pub fn open_bulk(&self, meta: &BulkMetadata) -> Result<Body, StreamError> {
        log::info!(
            "Opening {} export ({} bytes, updated {})",
            meta.kind,
            meta.size,
            meta.updated_at.format("%Y-%m-%d %H:%M")
        );
        let mut token = self.limiter.acquire();
        let body = self.transport.open(&meta.download_uri);
        token.release();

        let mut body = body?;
        if meta.declares_gzip() && !meta.download_uri.ends_with(".gz") {
            body = body.gunzip_if_compressed()?;
        }
        if body.total_bytes.is_none() && meta.size > 0 {
            body.total_bytes = Some(meta.size);
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardex_core::StaticTransport;
    use std::io::Read;
    use std::time::Duration;

    fn client(transport: StaticTransport) -> (Arc<StaticTransport>, ScryfallClient) {
        let transport = Arc::new(transport);
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(1)));
        let client = ScryfallClient::new(transport.clone(), limiter, "https://api.test/");
        (transport, client)
    }

    const CATALOG: &str = r#"{"object": "list", "data": [
        {"type": "all_cards", "download_uri": "https://data.test/all.json", "size": 9, "updated_at": "2024-05-01T09:12:44Z"},
        {"type": "rulings", "download_uri": "https://data.test/rulings.json", "updated_at": "2024-05-01T09:12:44Z"}
    ]}"#;

    #[test]
    fn trailing_slash_trimmed() {
        let (_, c) = client(StaticTransport::new());
        assert_eq!(c.base_url(), "https://api.test");
    }

    #[test]
    fn sets_pages_from_sets_endpoint() {
        let t = StaticTransport::new().with(
            "https://api.test/sets",
            r#"{"has_more": false, "data": [{"id": "s1", "code": "lea", "name": "Limited Edition Alpha"}]}"#,
        );
        let (transport, c) = client(t);
        let sets: Vec<RemoteSet> = c.sets().collect();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].code, "lea");
        assert_eq!(transport.requests(), vec!["https://api.test/sets"]);
    }

    #[test]
    fn find_bulk_by_kind() {
        let t = StaticTransport::new().with("https://api.test/bulk-data", CATALOG);
        let (_, c) = client(t);
        let meta = c.find_bulk(BulkKind::Rulings).unwrap();
        assert_eq!(meta.download_uri, "https://data.test/rulings.json");
        assert!(c.find_bulk(BulkKind::OracleCards).is_err());
    }

    #[test]
    fn open_bulk_streams_download_uri() {
        let t = StaticTransport::new()
            .with("https://api.test/bulk-data", CATALOG)
            .with("https://data.test/all.json", "[{}, {}]");
        let (_, c) = client(t);
        let meta = c.find_bulk(BulkKind::AllCards).unwrap();
        let mut body = c.open_bulk(&meta).unwrap();
        let mut text = String::new();
        body.reader.read_to_string(&mut text).unwrap();
        assert_eq!(text, "[{}, {}]");
    }

    #[test]
    fn open_bulk_decodes_declared_gzip() {
        use std::io::Write;
        let mut enc =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::fast());
        enc.write_all(b"[{}]").unwrap();
        let catalog = r#"{"data": [{"type": "rulings", "download_uri": "https://data.test/r.json",
            "updated_at": "2024-05-01T09:12:44Z", "content_encoding": "gzip"}]}"#;
        let t = StaticTransport::new()
            .with("https://api.test/bulk-data", catalog)
            .with("https://data.test/r.json", enc.finish().unwrap());
        let (_, c) = client(t);
        let meta = c.find_bulk(BulkKind::Rulings).unwrap();
        assert!(meta.declares_gzip());
        let mut body = c.open_bulk(&meta).unwrap();
        let mut text = String::new();
        body.reader.read_to_string(&mut text).unwrap();
        assert_eq!(text, "[{}]");
    }

    #[test]
    fn catalog_failure_is_error() {
        let (_, c) = client(StaticTransport::new());
        let err = c.bulk_catalog().unwrap_err();
        assert!(format!("{err:#}").contains("404"));
    }
}
