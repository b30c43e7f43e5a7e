//! Graceful shutdown coordination utilities.
//!
//! Provides a lightweight [`ShutdownCoordinator`] shared across the engine
//! and bulk operations so Ctrl+C cancels in-flight work cleanly: sends stop,
//! backoff timers are abandoned, and no retry fires after disposal. The
//! coordinator is always passed in explicitly; there is no global registry.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Shared handle to a shutdown coordinator.
pub type SharedShutdown = Arc<ShutdownCoordinator>;

/// Coordinates graceful shutdown across async tasks.
#[derive(Debug, Default)]
pub struct ShutdownCoordinator {
    is_shutdown: AtomicBool,
    notify: Notify,
}

impl ShutdownCoordinator {
    /// Create a new coordinator.
    pub fn new() -> Self {
        Self {
            is_shutdown: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    /// Create a new shared coordinator wrapped in [`Arc`].
    pub fn shared() -> SharedShutdown {
        Arc::new(Self::new())
    }

    /// Request shutdown. Notifies all waiters exactly once.
    pub fn request_shutdown(&self) {
        if !self.is_shutdown.swap(true, Ordering::SeqCst) {
            self.notify.notify_waiters();
        }
    }

    /// Whether shutdown has been requested.
    pub fn is_shutdown_requested(&self) -> bool {
        self.is_shutdown.load(Ordering::SeqCst)
    }

    /// Wait until shutdown is requested. Returns immediately if already set.
    pub async fn wait_for_shutdown(&self) {
        if self.is_shutdown_requested() {
            return;
        }
        self.notify.notified().await;
    }
}
