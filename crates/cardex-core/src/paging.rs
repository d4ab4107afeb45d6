//! Cursor-following list paginator.
//!
//! List endpoints answer with `{"has_more": bool, "next_page": uri, "data": [...]}`.
//! [`Paginator`] walks that chain lazily: one rate-limited request per page,
//! at most one decoded page in memory, elements yielded in page order.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::rate_limit::RateLimiter;
use crate::stream::{StreamError, Transport};

/// One page of a list response.
#[derive(Debug, Deserialize)]
pub struct ListPage<T> {
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_page: Option<String>,
    pub data: Vec<T>,
}

/// Failure fetching or decoding a single page.
#[derive(Debug)]
pub enum PageError {
    Stream(StreamError),
    Decode(serde_json::Error),
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stream(e) => write!(f, "{e}"),
            Self::Decode(e) => write!(f, "decode: {e}"),
        }
    }
}

impl std::error::Error for PageError {}

/// How far a pagination pass got.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PagingOutcome {
    pub pages: usize,
    pub items: usize,
    /// Why iteration stopped before the last page, if it did
    pub truncated: Option<String>,
}

impl PagingOutcome {
    pub fn is_complete(&self) -> bool {
        self.truncated.is_none()
    }
}

/// Lazy, single-pass sequence of list elements.
///
/// A page that fails to fetch or decode ends the sequence early; the reason is
/// logged and kept in [`Paginator::outcome`].
pub struct Paginator<T> {
    transport: Arc<dyn Transport>,
    limiter: Arc<RateLimiter>,
    next_uri: Option<String>,
    buffer: std::vec::IntoIter<T>,
    /// URIs already fetched; a cursor pointing back at one ends the listing
    visited: HashSet<String>,
    outcome: PagingOutcome,
}

impl<T> fmt::Debug for Paginator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Paginator")
            .field("next_uri", &self.next_uri)
            .field("outcome", &self.outcome)
            .finish_non_exhaustive()
    }
}

impl<T: DeserializeOwned> Paginator<T> {
    pub fn new(
        transport: Arc<dyn Transport>,
        limiter: Arc<RateLimiter>,
        start_uri: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            limiter,
            next_uri: Some(start_uri.into()),
            buffer: Vec::new().into_iter(),
            visited: HashSet::new(),
            outcome: PagingOutcome::default(),
        }
    }

    /// Pages fetched and items yielded so far, plus truncation reason.
    pub fn outcome(&self) -> &PagingOutcome {
        &self.outcome
    }

    fn fetch_page(&self, uri: &str) -> Result<ListPage<T>, PageError> {
        let mut token = self.limiter.acquire();
        let body = self.transport.open(uri).map_err(PageError::Stream)?;
        let page = serde_json::from_reader(body.reader).map_err(PageError::Decode);
        token.release();
        page
    }
}

impl<T: DeserializeOwned> Iterator for Paginator<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        loop {
            if let Some(item) = self.buffer.next() {
                self.outcome.items += 1;
                return Some(item);
            }

            let uri = self.next_uri.take()?;
            self.visited.insert(uri.clone());
            match self.fetch_page(&uri) {
                Ok(page) => {
                    self.outcome.pages += 1;
                    log::debug!(
                        "page {}: {} items (has_more={})",
                        self.outcome.pages,
                        page.data.len(),
                        page.has_more
                    );
                    if page.has_more {
                        match page.next_page {
                            Some(next) if self.visited.contains(&next) => {
                                log::warn!("{uri}: next_page {next} was already fetched, stopping");
                                self.outcome.truncated =
                                    Some(format!("next_page loops back to {next}"));
                            }
                            Some(next) if !next.is_empty() => self.next_uri = Some(next),
                            _ => {
                                log::warn!("{uri}: has_more without next_page, stopping");
                                self.outcome.truncated =
                                    Some("has_more set without next_page".to_string());
                            }
                        }
                    }
                    self.buffer = page.data.into_iter();
                }
                Err(e) => {
                    log::warn!(
                        "{uri}: page {} failed, ending list early: {e}",
                        self.outcome.pages + 1
                    );
                    self.outcome.truncated = Some(e.to_string());
                    return None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::StaticTransport;
    use std::time::Duration;

    fn paginator(transport: StaticTransport, start: &str) -> (Arc<StaticTransport>, Paginator<u32>) {
        let transport = Arc::new(transport);
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(1)));
        let p = Paginator::new(transport.clone(), limiter, start);
        (transport, p)
    }

    #[test]
    fn two_pages_concatenate_in_order() {
        let t = StaticTransport::new()
            .with(
                "https://api/list",
                r#"{"has_more": true, "next_page": "https://api/list?page=2", "data": [1, 2]}"#,
            )
            .with(
                "https://api/list?page=2",
                r#"{"has_more": false, "data": [3]}"#,
            );
        let (transport, mut p) = paginator(t, "https://api/list");

        let items: Vec<u32> = p.by_ref().collect();
        assert_eq!(items, vec![1, 2, 3]);
        assert_eq!(p.outcome().pages, 2);
        assert_eq!(p.outcome().items, 3);
        assert!(p.outcome().is_complete());
        assert_eq!(transport.requests().len(), 2);
    }

    #[test]
    fn failing_second_page_truncates() {
        let t = StaticTransport::new().with(
            "https://api/list",
            r#"{"has_more": true, "next_page": "https://api/missing", "data": [1]}"#,
        );
        let (_, mut p) = paginator(t, "https://api/list");

        let items: Vec<u32> = p.by_ref().collect();
        assert_eq!(items, vec![1]);
        assert!(!p.outcome().is_complete());
        assert!(p.outcome().truncated.as_deref().unwrap().contains("404"));
    }

    #[test]
    fn undecodable_page_truncates() {
        let t = StaticTransport::new().with("https://api/list", "{\"data\": [1, ");
        let (_, mut p) = paginator(t, "https://api/list");

        assert_eq!(p.by_ref().count(), 0);
        assert!(p.outcome().truncated.as_deref().unwrap().starts_with("decode"));
    }

    #[test]
    fn has_more_without_next_page_stops() {
        let t = StaticTransport::new().with("https://api/list", r#"{"has_more": true, "data": [5]}"#);
        let (transport, mut p) = paginator(t, "https://api/list");

        assert_eq!(p.by_ref().collect::<Vec<_>>(), vec![5]);
        assert!(!p.outcome().is_complete());
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn cursor_back_to_fetched_page_stops() {
        let t = StaticTransport::new()
            .with(
                "https://api/list",
                r#"{"has_more": true, "next_page": "https://api/list?page=2", "data": [1]}"#,
            )
            .with(
                "https://api/list?page=2",
                r#"{"has_more": true, "next_page": "https://api/list?page=2", "data": [2]}"#,
            );
        let (transport, mut p) = paginator(t, "https://api/list");

        assert_eq!(p.by_ref().collect::<Vec<_>>(), vec![1, 2]);
        assert!(p.outcome().truncated.as_deref().unwrap().contains("loops back"));
        assert_eq!(transport.requests().len(), 2);
    }

    #[test]
    fn lazy_until_polled() {
        let t = StaticTransport::new().with("https://api/list", r#"{"data": []}"#);
        let (transport, _p) = paginator(t, "https://api/list");
        assert!(transport.requests().is_empty());
    }
}
