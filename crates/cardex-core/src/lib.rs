//! cardex core - shared infrastructure for catalog ingestion
//!
//! HTTP transport, call spacing, list paging and streaming JSON decoding,
//! plus logging and progress plumbing used by every pipeline stage.

pub mod json_array;
pub mod logging;
pub mod paging;
pub mod progress;
pub mod rate_limit;
pub mod retry;
pub mod stream;

// Re-exports for convenience
pub use json_array::{ArrayError, for_each_element};
pub use logging::{IndicatifLogger, init_logging};
pub use paging::{ListPage, PageError, Paginator, PagingOutcome};
pub use progress::{ProgressContext, SharedProgress, fmt_num, upgrade_to_bar};
pub use rate_limit::{DEFAULT_MIN_INTERVAL, RateLimiter, RateToken};
pub use stream::{
    Body, ByteCounter, HttpConfig, HttpTransport, SHARED_RUNTIME, StaticTransport, StreamError,
    Transport,
};
