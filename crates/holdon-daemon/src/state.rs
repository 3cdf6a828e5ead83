//! Shared daemon state.
//!
//! Durable stores and the classifier live directly on the handle; each
//! store serializes its own read-modify-write cycles internally. The inner
//! `RwLock` guards only the transient maps (intercept tracker, trace
//! buffer), which are rebuilt empty on every daemon start by design.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use holdon_core::access_log::AccessLogStore;
use holdon_core::classifier::Classifier;
use holdon_core::config::HoldonConfig;
use holdon_core::exemption::ExemptionStore;
use holdon_core::storage::JsonStore;
use holdon_core::trace::TraceBuffer;
use tokio::sync::{Notify, RwLock};

use crate::tracker::InterceptTracker;

/// Shared daemon state protected by `Arc`.
pub type SharedState = Arc<DaemonStateHandle>;

/// Handle to daemon state with interior mutability.
pub struct DaemonStateHandle {
    classifier: Classifier,
    exemptions: ExemptionStore,
    access_log: AccessLogStore,
    intercept_url: String,
    /// Transient per-navigation state.
    inner: RwLock<DaemonState>,
    /// Shutdown flag (atomic for lock-free checking).
    shutdown: AtomicBool,
    /// Wakes the accept loop when shutdown is requested.
    shutdown_notify: Notify,
    /// Time when the daemon started.
    started_at: DateTime<Utc>,
}

impl DaemonStateHandle {
    /// Build daemon state from configuration, with stores rooted at the
    /// (already normalized) data directory.
    #[must_use]
    pub fn new(config: &HoldonConfig, data_dir: std::path::PathBuf) -> Self {
        Self {
            classifier: Classifier::new(config.blocked()),
            exemptions: ExemptionStore::new(JsonStore::new(data_dir.clone())),
            access_log: AccessLogStore::new(JsonStore::new(data_dir)),
            intercept_url: config.daemon.intercept_url.clone(),
            inner: RwLock::new(DaemonState {
                tracker: InterceptTracker::new(),
                traces: TraceBuffer::default(),
            }),
            shutdown: AtomicBool::new(false),
            shutdown_notify: Notify::new(),
            started_at: Utc::now(),
        }
    }

    /// The store-backed classifier.
    #[must_use]
    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// The durable exemption store.
    #[must_use]
    pub fn exemptions(&self) -> &ExemptionStore {
        &self.exemptions
    }

    /// The durable access log.
    #[must_use]
    pub fn access_log(&self) -> &AccessLogStore {
        &self.access_log
    }

    /// Base URL of the interception surface.
    #[must_use]
    pub fn intercept_url(&self) -> &str {
        &self.intercept_url
    }

    /// Get read access to the transient state.
    pub async fn read(&self) -> tokio::sync::RwLockReadGuard<'_, DaemonState> {
        self.inner.read().await
    }

    /// Get write access to the transient state.
    pub async fn write(&self) -> tokio::sync::RwLockWriteGuard<'_, DaemonState> {
        self.inner.write().await
    }

    /// Check if shutdown has been requested.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Request shutdown and wake the accept loop.
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.shutdown_notify.notify_waiters();
    }

    /// Wait until shutdown is requested.
    pub async fn shutdown_requested(&self) {
        // Register before checking the flag so a wakeup between the check
        // and the await is not lost.
        let mut notified = std::pin::pin!(self.shutdown_notify.notified());
        notified.as_mut().enable();
        if self.is_shutdown_requested() {
            return;
        }
        notified.await;
    }

    /// Get daemon uptime in seconds.
    #[must_use]
    pub fn uptime_secs(&self) -> u64 {
        let now = Utc::now();
        u64::try_from((now - self.started_at).num_seconds().max(0)).unwrap_or(0)
    }
}

/// Inner daemon state (transient part).
pub struct DaemonState {
    /// Open intercepts keyed by tab id.
    pub tracker: InterceptTracker,
    /// Recent decision traces keyed by log id.
    pub traces: TraceBuffer,
}
