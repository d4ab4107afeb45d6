//! Minimum-interval gate for outbound catalog calls.
//!
//! One mutex guards the instant of the last release. Holding a [`RateToken`]
//! holds the gate, so calls are serialized and the delay is paid once per
//! acquire/release cycle no matter how many callers are waiting.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Default spacing between calls to the catalog API.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(100);

/// Serializes callers and spaces them by at least `min_interval`.
#[derive(Debug)]
pub struct RateLimiter {
    last_release: Mutex<Option<Instant>>,
    min_interval: Duration,
}

/// Scoped permission to perform exactly one request.
///
/// Released explicitly with [`RateToken::release`] or on drop.
#[derive(Debug)]
pub struct RateToken<'a> {
    guard: Option<MutexGuard<'a, Option<Instant>>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            last_release: Mutex::new(None),
            min_interval,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Block until the gate is free and the interval since the last release
    /// has passed. Never fails.
    pub fn acquire(&self) -> RateToken<'_> {
        let guard = self
            .last_release
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(last) = *guard {
            let ready_at = last + self.min_interval;
            let now = Instant::now();
            if ready_at > now {
                std::thread::sleep(ready_at - now);
            }
        }
        RateToken { guard: Some(guard) }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }
}

impl RateToken<'_> {
    /// Stamp the release time and open the gate. Idempotent.
    pub fn release(&mut self) {
        if let Some(mut guard) = self.guard.take() {
            *guard = Some(Instant::now());
        }
    }
}

impl Drop for RateToken<'_> {
    fn drop(&mut self) {
        self.release();
    }
}
