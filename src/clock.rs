//! Server clock estimate
//!
//! The API reports its own clock in the `Date` response header. Downstream
//! bulk operations filter by server-side timestamps, so local clock skew
//! matters: this tracker captures the server time together with a local
//! monotonic instant and reconstructs "server now" by adding the elapsed
//! monotonic duration. Pure bookkeeping; it never blocks.

use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::header::{HeaderMap, DATE};
use std::sync::Mutex;
use std::time::Instant;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
struct ClockSample {
    server_time: DateTime<Utc>,
    observed_at: Instant,
}

/// Process-wide estimate of the server's clock.
///
/// Updated on every response carrying a parsable `Date` header; the sample
/// is only ever overwritten, never removed. Mutex-guarded because the
/// engine may serve concurrent logical requests.
#[derive(Debug, Default)]
pub struct ServerClock {
    sample: Mutex<Option<ClockSample>>,
}

/// Parse an HTTP date header value: `"<Weekday>, <DD> <Mon> <YYYY> <HH>:<MM>:<SS> GMT"`.
///
/// The trailing `GMT` literal is ignored; the timestamp is taken as UTC.
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim().trim_end_matches("GMT").trim_end();
    NaiveDateTime::parse_from_str(trimmed, "%a, %d %b %Y %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

impl ServerClock {
    /// Create an empty estimate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract and record the `Date` header from a response, if present and
    /// parsable. Returns whether the estimate was updated.
    pub fn observe(&self, headers: &HeaderMap) -> bool {
        let Some(value) = headers.get(DATE).and_then(|v| v.to_str().ok()) else {
            return false;
        };
        self.observe_date_value(value)
    }

    /// Record a raw `Date` header value.
    pub fn observe_date_value(&self, value: &str) -> bool {
        let Some(server_time) = parse_http_date(value) else {
            debug!("unparsable date header: {value:?}");
            return false;
        };
        let mut guard = self.sample.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(ClockSample {
            server_time,
            observed_at: Instant::now(),
        });
        true
    }

    /// The server time as last observed, without elapsed correction.
    pub fn last_observed(&self) -> Option<DateTime<Utc>> {
        let guard = self.sample.lock().unwrap_or_else(|e| e.into_inner());
        guard.map(|sample| sample.server_time)
    }

    /// Estimate the server's current time: the captured server time plus
    /// the monotonic duration elapsed since capture. `None` until the first
    /// observation.
    pub fn estimate_now(&self) -> Option<DateTime<Utc>> {
        let guard = self.sample.lock().unwrap_or_else(|e| e.into_inner());
        guard.map(|sample| {
            let elapsed = chrono::Duration::from_std(sample.observed_at.elapsed())
                .unwrap_or_else(|_| chrono::Duration::zero());
            sample.server_time + elapsed
        })
    }
}
