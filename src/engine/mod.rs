//! Request/retry/pagination engine
//!
//! The engine owns the wire: it sends immutable request descriptors, walks
//! cursor pagination, and classifies response statuses into the retry state
//! machine. One physical HTTP call is in flight per logical request at any
//! time; a new page or retry is not sent until the previous response (or
//! backoff timer) has fired.
//!
//! Status dispositions:
//! - success: hand the body and headers to the caller (and, when the page
//!   carries a cursor, chain the next page)
//! - 404: expected absence, completes with an empty result
//! - 429: resend the same descriptor after the fixed backoff schedule
//! - 502/504: resend the same descriptor immediately
//! - anything else: terminal failure carrying status and body text
//!
//! Protocol conditions never panic and never raise through a side channel:
//! absence is `Ok(None)`, failures are typed [`EngineError`] values.

use crate::api::request::RequestDescriptor;
use crate::api::response::Page;
use crate::api::ApiError;
use crate::clock::ServerClock;
use crate::shutdown::SharedShutdown;
use crate::transport_log::TransportLog;
use crate::PagedResult;
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub mod config;

pub use config::{throttle_backoff, RetryPolicy, TransportErrorPolicy};

/// Engine errors
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A request could not be built
    #[error("request build error: {0}")]
    Build(#[from] ApiError),

    /// Network-level failure that never produced an HTTP status
    #[error("transport error: {0}")]
    Transport(String),

    /// Terminal HTTP failure; body is surfaced as the diagnostic
    #[error("request failed with status {status}: {body}")]
    Fatal {
        /// HTTP status code
        status: u16,
        /// Response body text
        body: String,
    },

    /// The configured attempt budget was spent without a terminal response
    #[error("retry budget exhausted after {attempts} attempts")]
    RetriesExhausted {
        /// Attempts made before giving up
        attempts: u32,
    },

    /// The owning request was cancelled via the shutdown coordinator
    #[error("operation cancelled")]
    Cancelled,
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Callback interface for request lifecycle events.
///
/// All methods default to no-ops; a CLI or service wrapper subscribes by
/// overriding what it cares about. No UI framework involved.
pub trait RequestObserver: Send + Sync {
    /// Progress message (request issued, retry scheduled, ...)
    fn on_status(&self, _message: &str) {}
    /// A logical request finished with a usable result
    fn on_complete(&self, _summary: &str) {}
    /// A logical request terminated without a usable result
    fn on_error(&self, _message: &str) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default)]
pub struct NullObserver;

impl RequestObserver for NullObserver {}

/// A successful raw response: status, headers and body text.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status (always a success status)
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body text
    pub body: String,
}

/// Retry bookkeeping for one logical request.
///
/// The throttle count drives the backoff schedule and is deliberately not
/// reset between pages: persistent throttling grows the delay monotonically
/// across a whole paginated operation.
#[derive(Debug, Clone, Default)]
pub struct RetryState {
    throttle_count: u32,
    attempts: u32,
}

impl RetryState {
    /// Number of 429 responses seen so far.
    pub fn throttle_count(&self) -> u32 {
        self.throttle_count
    }

    /// Total send attempts so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

/// The request/retry/pagination engine.
///
/// Owns the HTTP client, the transport log and the server clock estimate.
/// Construct one per process and share it; every collaborator is passed in
/// explicitly, there are no hidden globals.
#[derive(Clone)]
pub struct RequestEngine {
    http: Client,
    policy: RetryPolicy,
    log: Arc<TransportLog>,
    clock: Arc<ServerClock>,
    observer: Arc<dyn RequestObserver>,
    shutdown: Option<SharedShutdown>,
}

impl RequestEngine {
    /// Create an engine with its own HTTP client.
    ///
    /// The client gets explicit connect and request timeouts so a stuck
    /// connection cannot hang a logical request indefinitely.
    pub fn new(policy: RetryPolicy) -> Self {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(config::HTTP_CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(config::HTTP_REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|e| {
                panic!("FATAL: failed to build HTTP client: {e}. Check system TLS configuration.")
            });
        Self::with_http_client(http, policy)
    }

    /// Create an engine around an existing HTTP client.
    pub fn with_http_client(http: Client, policy: RetryPolicy) -> Self {
        Self {
            http,
            policy,
            log: Arc::new(TransportLog::new()),
            clock: Arc::new(ServerClock::new()),
            observer: Arc::new(NullObserver),
            shutdown: None,
        }
    }

    /// Attach a lifecycle observer.
    pub fn with_observer(mut self, observer: Arc<dyn RequestObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Attach a shared shutdown handle for cooperative cancellation.
    ///
    /// Cancellation is checked before every send, and backoff sleeps race
    /// against the shutdown notification so a retry timer never outlives
    /// its owner.
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// The transport log every request is recorded into.
    pub fn transport_log(&self) -> Arc<TransportLog> {
        Arc::clone(&self.log)
    }

    /// The server clock estimate updated from response date headers.
    pub fn server_clock(&self) -> Arc<ServerClock> {
        Arc::clone(&self.clock)
    }

    /// The retry policy in effect.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    fn ensure_not_cancelled(&self) -> EngineResult<()> {
        if let Some(shutdown) = &self.shutdown {
            if shutdown.is_shutdown_requested() {
                return Err(EngineError::Cancelled);
            }
        }
        Ok(())
    }

    async fn backoff_sleep(&self, delay: Duration) -> EngineResult<()> {
        match &self.shutdown {
            Some(shutdown) => {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => Ok(()),
                    _ = shutdown.wait_for_shutdown() => Err(EngineError::Cancelled),
                }
            }
            None => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
        }
    }

    /// Send one descriptor until it reaches a terminal disposition.
    ///
    /// Returns `Ok(Some(..))` for a success response, `Ok(None)` for 404
    /// (expected absence). Resends internally on 429 (after backoff) and on
    /// 502/504 (immediately), sharing `retry` across resends; a paginated
    /// caller passes the same state for every page.
    pub async fn dispatch(
        &self,
        descriptor: &RequestDescriptor,
        retry: &mut RetryState,
    ) -> EngineResult<Option<RawResponse>> {
        loop {
            self.ensure_not_cancelled()?;

            retry.attempts += 1;
            if let Some(max_attempts) = self.policy.max_attempts {
                if retry.attempts > max_attempts {
                    let message =
                        format!("retry budget exhausted after {max_attempts} attempts");
                    self.observer.on_error(&message);
                    return Err(EngineError::RetriesExhausted {
                        attempts: max_attempts,
                    });
                }
            }

            // Pre-send: failed and aborted requests are recorded too.
            self.log
                .record(descriptor.method.as_str(), descriptor.url.as_str());
            self.observer
                .on_status(&format!("{} {}", descriptor.method, descriptor.url));

            let mut request = self
                .http
                .request(descriptor.method.clone(), descriptor.url.clone());
            for (name, value) in &descriptor.headers {
                request = request.header(*name, value.as_str());
            }
            if let Some(body) = &descriptor.body {
                request = request.body(body.clone());
            }

            let response = match request.send().await {
                Ok(response) => response,
                Err(error) => match self.policy.transport_errors {
                    TransportErrorPolicy::Fatal => {
                        let message = format!("transport error: {error}");
                        self.observer.on_error(&message);
                        return Err(EngineError::Transport(error.to_string()));
                    }
                    TransportErrorPolicy::RetryWithBackoff => {
                        retry.throttle_count += 1;
                        let delay = throttle_backoff(retry.throttle_count);
                        warn!(
                            "transport error on {} {}: {}; resending after {:?}",
                            descriptor.method, descriptor.url, error, delay
                        );
                        self.backoff_sleep(delay).await?;
                        continue;
                    }
                },
            };

            let status = response.status();
            let headers = response.headers().clone();
            let body = response
                .text()
                .await
                .map_err(|e| EngineError::Transport(e.to_string()))?;

            if status.is_success() {
                self.clock.observe(&headers);
                debug!("{} {} -> {}", descriptor.method, descriptor.url, status);
                return Ok(Some(RawResponse {
                    status,
                    headers,
                    body,
                }));
            }

            match status.as_u16() {
                404 => {
                    debug!("{} {} -> 404 (absent)", descriptor.method, descriptor.url);
                    return Ok(None);
                }
                429 => {
                    retry.throttle_count += 1;
                    let delay = throttle_backoff(retry.throttle_count);
                    warn!(
                        "throttled (429) on {} {}, occurrence {}, resending after {:?}",
                        descriptor.method, descriptor.url, retry.throttle_count, delay
                    );
                    self.observer.on_status(&format!(
                        "throttled, retrying in {}ms",
                        delay.as_millis()
                    ));
                    self.backoff_sleep(delay).await?;
                }
                502 | 504 => {
                    warn!(
                        "gateway error ({}) on {} {}, resending",
                        status, descriptor.method, descriptor.url
                    );
                }
                _ => {
                    let message =
                        format!("request failed with status {}: {}", status.as_u16(), body);
                    self.observer.on_error(&message);
                    return Err(EngineError::Fatal {
                        status: status.as_u16(),
                        body,
                    });
                }
            }
        }
    }

    /// Execute one single-shot logical request (detail GET, POST, DELETE).
    ///
    /// `Ok(None)` means the resource does not exist, which for detail
    /// lookups is a normal outcome rather than an error.
    pub async fn send(
        &self,
        descriptor: &RequestDescriptor,
    ) -> EngineResult<Option<RawResponse>> {
        let mut retry = RetryState::default();
        let outcome = self.dispatch(descriptor, &mut retry).await?;
        self.observer
            .on_complete(&format!("{} {} done", descriptor.method, descriptor.url));
        Ok(outcome)
    }

    /// Execute one paginated logical request to completion.
    ///
    /// `build` maps the current cursor to a descriptor for the next page;
    /// `parse` decodes a page body, returning `None` when the body has
    /// nothing to report. The walk stops when the cursor is absent or
    /// empty, when a page yields nothing new, or once the accumulated item
    /// count meets `result_limit` (a soft cap: an already-received page is
    /// never truncated). Retry state spans the whole walk.
    pub async fn fetch_paged<T, B, P>(
        &self,
        mut build: B,
        parse: P,
        result_limit: Option<usize>,
    ) -> EngineResult<PagedResult<T>>
    where
        B: FnMut(Option<&str>) -> Result<RequestDescriptor, ApiError>,
        P: Fn(&str) -> Option<Page<T>>,
    {
        let mut accumulated = PagedResult::default();
        let mut retry = RetryState::default();
        let mut pages = 0usize;

        loop {
            if let Some(limit) = result_limit {
                if accumulated.items.len() >= limit {
                    debug!(
                        "result limit {} reached with {} items after {} pages",
                        limit,
                        accumulated.items.len(),
                        pages
                    );
                    break;
                }
            }

            let descriptor = build(accumulated.cursor.as_deref())?;
            let Some(response) = self.dispatch(&descriptor, &mut retry).await? else {
                // 404: nothing to report.
                break;
            };
            pages += 1;

            let Some(page) = parse(&response.body) else {
                break;
            };
            if page.items.is_empty() {
                break;
            }

            debug!("page {} yielded {} items", pages, page.items.len());
            accumulated.items.extend(page.items);

            match page.cursor {
                Some(cursor) if !cursor.is_empty() => accumulated.cursor = Some(cursor),
                _ => {
                    accumulated.cursor = None;
                    break;
                }
            }
        }

        self.observer.on_complete(&format!(
            "collected {} items over {} pages",
            accumulated.items.len(),
            pages
        ));
        Ok(accumulated)
    }
}
