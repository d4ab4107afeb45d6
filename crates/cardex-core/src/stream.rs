//! HTTP streaming with optional gzip decompression and read timeout.
//!
//! Uses async reqwest internally with tokio::time::timeout for stall detection,
//! but presents a sync `BufRead` interface so decoders can pull bytes as they
//! arrive without buffering whole responses.

use std::collections::HashMap;
use std::io::{self, BufRead, BufReader, Cursor, Read};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock, Mutex, PoisonError};
use std::task::Context;
use std::time::Duration;

use flate2::read::GzDecoder;
use futures_util::StreamExt;
use tokio::io::{AsyncRead, ReadBuf};

use crate::retry::retry_with_backoff;

/// Buffer size for response readers (256KB)
const BODY_BUF_SIZE: usize = 256 * 1024;

/// Transport settings shared by every outbound request.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// No data for this long = stall
    pub read_timeout: Duration,
    pub connect_timeout: Duration,
    /// Retries for the initial request (429, 5xx, connection errors)
    pub max_retries: u32,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(30),
            max_retries: 3,
            user_agent: concat!("cardex/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Error types for stream operations
#[derive(Debug)]
pub enum StreamError {
    /// HTTP error with optional status code
    Http {
        status: Option<u16>,
        message: String,
    },
    /// I/O error
    Io(std::io::Error),
}

impl std::fmt::Display for StreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http {
                status: Some(s),
                message,
            } => write!(f, "HTTP {s}: {message}"),
            Self::Http {
                status: None,
                message,
            } => write!(f, "HTTP error: {message}"),
            Self::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for StreamError {}

impl StreamError {
    /// Create HTTP error from reqwest error, without the request URL
    pub fn from_reqwest(e: reqwest::Error) -> Self {
        Self::Http {
            status: e.status().map(|s| s.as_u16()),
            message: e.without_url().to_string(),
        }
    }

    /// Rate limiting, server errors and connection failures are worth another try.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { status, .. } => {
                matches!(status, None | Some(429) | Some(500..=599))
            }
            Self::Io(e) => e.kind() != std::io::ErrorKind::StorageFull,
        }
    }
}

impl From<std::io::Error> for StreamError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Shared tokio runtime for HTTP operations.
pub static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

/// Shared byte counter for progress tracking
pub type ByteCounter = Arc<AtomicU64>;

/// An opened response body.
pub struct Body {
    pub reader: Box<dyn BufRead + Send>,
    /// Bytes pulled off the wire so far (before decompression)
    pub counter: ByteCounter,
    /// Content-Length, when the server sent one
    pub total_bytes: Option<u64>,
}

impl std::fmt::Debug for Body {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Body")
            .field("total_bytes", &self.total_bytes)
            .finish_non_exhaustive()
    }
}

impl Body {
    /// Gunzip the body if it starts with the gzip magic bytes.
    ///
    /// For sources that declare gzip out of band; a body that was already
    /// decoded is returned unchanged.
    pub fn gunzip_if_compressed(mut self) -> io::Result<Self> {
        let gzip = self.reader.fill_buf()?.starts_with(&[0x1f, 0x8b]);
        if gzip {
            self.reader = Box::new(BufReader::with_capacity(
                BODY_BUF_SIZE,
                GzDecoder::new(self.reader),
            ));
        }
        Ok(self)
    }
}

/// Source of raw response bodies for outbound GETs.
///
/// One call is one request; callers decode the returned stream themselves.
pub trait Transport: Send + Sync {
    fn open(&self, url: &str) -> Result<Body, StreamError>;
}

/// reqwest-backed transport.
pub struct HttpTransport {
    client: reqwest::Client,
    config: HttpConfig,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    pub fn new(config: HttpConfig) -> Result<Self, StreamError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .pool_max_idle_per_host(4)
            .build()
            .map_err(StreamError::from_reqwest)?;
        Ok(Self { client, config })
    }

    fn attempt(&self, url: &str) -> Result<Body, StreamError> {
        let (reader, total_bytes, gzip) = SHARED_RUNTIME.handle().block_on(async {
            let response = self
                .client
                .get(url)
                .header(reqwest::header::ACCEPT, "application/json")
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(StreamError::from_reqwest)?;

            let total_bytes = response.content_length();
            let gzip = url.ends_with(".gz")
                || response
                    .headers()
                    .get(reqwest::header::CONTENT_ENCODING)
                    .and_then(|v| v.to_str().ok())
                    .is_some_and(|v| v.eq_ignore_ascii_case("gzip"));

            let stream = response.bytes_stream();
            let async_reader = tokio_util::io::StreamReader::new(
                stream.map(|result| result.map_err(io::Error::other)),
            );

            Ok::<_, StreamError>((
                TimeoutReader::new(Box::pin(async_reader), self.config.read_timeout),
                total_bytes,
                gzip,
            ))
        })?;

        Ok(wrap_body(reader, total_bytes, gzip))
    }
}

impl Transport for HttpTransport {
    fn open(&self, url: &str) -> Result<Body, StreamError> {
        retry_with_backoff(url, self.config.max_retries, || self.attempt(url))
    }
}

/// Count → (gunzip) → buffer.
fn wrap_body<R: Read + Send + 'static>(inner: R, total_bytes: Option<u64>, gzip: bool) -> Body {
    let counter = Arc::new(AtomicU64::new(0));
    let counting = CountingReader {
        inner,
        count: counter.clone(),
    };
    let reader: Box<dyn BufRead + Send> = if gzip {
        Box::new(BufReader::with_capacity(
            BODY_BUF_SIZE,
            GzDecoder::new(counting),
        ))
    } else {
        Box::new(BufReader::with_capacity(BODY_BUF_SIZE, counting))
    };
    Body {
        reader,
        counter,
        total_bytes,
    }
}

/// In-memory transport serving canned bodies by exact URL.
///
/// Records every requested URL, in order. Used for offline runs and tests.
#[derive(Debug, Default)]
pub struct StaticTransport {
    bodies: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<String>>,
}

impl StaticTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `url`.
    pub fn with(mut self, url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.bodies.insert(url.into(), body.into());
        self
    }

    /// URLs requested so far.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Transport for StaticTransport {
    fn open(&self, url: &str) -> Result<Body, StreamError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_string());
        let body = self.bodies.get(url).ok_or_else(|| StreamError::Http {
            status: Some(404),
            message: format!("no canned body for {url}"),
        })?;
        let len = body.len() as u64;
        Ok(wrap_body(Cursor::new(body.clone()), Some(len), url.ends_with(".gz")))
    }
}

/// Reader wrapper that tracks bytes read
pub struct CountingReader<R> {
    inner: R,
    count: ByteCounter,
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count.fetch_add(n as u64, Ordering::Relaxed);
        Ok(n)
    }
}

/// Async-to-sync bridge with read timeout.
///
/// Each read has a deadline; if no data arrives in time the read fails with
/// `TimedOut`, which surfaces to the decoder as an I/O error.
pub struct TimeoutReader {
    inner: Pin<Box<dyn AsyncRead + Send + Sync>>,
    timeout: Duration,
}

impl TimeoutReader {
    fn new(inner: Pin<Box<dyn AsyncRead + Send + Sync>>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

impl Read for TimeoutReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let timeout = self.timeout;
        SHARED_RUNTIME.handle().block_on(async {
            let read_future = async {
                let mut read_buf = ReadBuf::new(buf);
                std::future::poll_fn(|cx: &mut Context<'_>| {
                    Pin::as_mut(&mut self.inner).poll_read(cx, &mut read_buf)
                })
                .await?;
                Ok::<_, io::Error>(read_buf.filled().len())
            };

            match tokio::time::timeout(timeout, read_future).await {
                Ok(result) => result,
                Err(_) => Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("read timeout ({}s with no data)", timeout.as_secs()),
                )),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn http_err(status: u16) -> StreamError {
        StreamError::Http {
            status: Some(status),
            message: "test".to_string(),
        }
    }

    #[test]
    fn http_404_not_retryable() {
        assert!(!http_err(404).is_retryable());
    }

    #[test]
    fn http_429_retryable() {
        assert!(http_err(429).is_retryable());
    }

    #[test]
    fn http_503_retryable() {
        assert!(http_err(503).is_retryable());
    }

    #[test]
    fn http_none_status_retryable() {
        let err = StreamError::Http {
            status: None,
            message: "connection refused".to_string(),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn io_storage_full_not_retryable() {
        let err = StreamError::Io(io::Error::new(io::ErrorKind::StorageFull, "disk full"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn display_http_with_status() {
        assert_eq!(format!("{}", http_err(404)), "HTTP 404: test");
    }

    #[test]
    fn static_transport_serves_and_counts() {
        let transport = StaticTransport::new().with("https://x/a", "[1,2,3]");
        let mut body = transport.open("https://x/a").unwrap();
        let mut text = String::new();
        body.reader.read_to_string(&mut text).unwrap();
        assert_eq!(text, "[1,2,3]");
        assert_eq!(body.total_bytes, Some(7));
        assert_eq!(body.counter.load(Ordering::Relaxed), 7);
        assert_eq!(transport.requests(), vec!["https://x/a".to_string()]);
    }

    #[test]
    fn static_transport_unknown_url_is_404() {
        let transport = StaticTransport::new();
        match transport.open("https://x/missing") {
            Err(StreamError::Http { status, .. }) => assert_eq!(status, Some(404)),
            other => panic!("expected 404, got {other:?}"),
        }
    }

    #[test]
    fn gz_url_is_decompressed() {
        let mut enc = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::fast());
        enc.write_all(b"[\"a\"]").unwrap();
        let gz = enc.finish().unwrap();

        let transport = StaticTransport::new().with("https://x/cards.json.gz", gz);
        let mut body = transport.open("https://x/cards.json.gz").unwrap();
        let mut text = String::new();
        body.reader.read_to_string(&mut text).unwrap();
        assert_eq!(text, "[\"a\"]");
    }

    #[test]
    fn sniffed_gzip_is_decompressed_once() {
        let mut enc = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::fast());
        enc.write_all(b"[1,2]").unwrap();
        let transport = StaticTransport::new()
            .with("https://x/packed.json", enc.finish().unwrap())
            .with("https://x/plain.json", "[1,2]");

        for url in ["https://x/packed.json", "https://x/plain.json"] {
            let mut body = transport.open(url).unwrap().gunzip_if_compressed().unwrap();
            let mut text = String::new();
            body.reader.read_to_string(&mut text).unwrap();
            assert_eq!(text, "[1,2]", "{url}");
        }
    }
}
