//! Engine configuration constants and retry policy

use std::time::Duration;

/// Backoff schedule for HTTP 429 responses, indexed by how many 429s the
/// logical request has seen so far. The schedule is flat after the third
/// occurrence; it does not keep growing.
pub const THROTTLE_BACKOFF_MS: [u64; 3] = [2000, 4000, 8000];

/// HTTP connect timeout (seconds) - time to establish the TCP connection
pub const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;

/// HTTP request timeout (seconds) - overall time for one request/response
pub const HTTP_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Backoff delay before resending a throttled request.
///
/// `throttle_count` is the 1-indexed count of 429 responses seen by the
/// logical request so far, including the one just received. The count is
/// never reset between pages, so persistent throttling grows the delay
/// monotonically across a whole paginated operation.
pub fn throttle_backoff(throttle_count: u32) -> Duration {
    let index = throttle_count.saturating_sub(1).min(2) as usize;
    Duration::from_millis(THROTTLE_BACKOFF_MS[index])
}

/// Policy for network-level transport failures (DNS errors, refused
/// connections, timeouts) that never produced an HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportErrorPolicy {
    /// Surface the failure immediately as a terminal error.
    #[default]
    Fatal,
    /// Re-send after the same backoff schedule 429 responses use.
    RetryWithBackoff,
}

/// Retry behavior for one logical request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Upper bound on total send attempts across pages and retries.
    /// `None` retries until the caller cancels.
    pub max_attempts: Option<u32>,
    /// How to treat transport-level failures.
    pub transport_errors: TransportErrorPolicy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: None,
            transport_errors: TransportErrorPolicy::default(),
        }
    }
}
