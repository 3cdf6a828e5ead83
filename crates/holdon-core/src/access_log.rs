//! Interception journal: one entry per intercepted navigation.
//!
//! Entries are created in `Pending` state when the navigation monitor
//! redirects a tab to the friction screen, and move to exactly one terminal
//! state afterwards:
//!
//! ```text
//! Pending --Allowed(duration)--> Allowed   (user granted themselves time)
//! Pending --Blocked------------> Blocked   (user chose to stay away)
//! Pending --Closed-------------> Closed    (tab closed without a choice)
//! ```
//!
//! Entries are never deleted; the journal is the source of truth for the
//! daily-usage dashboard. It is best-effort telemetry, not a transactional
//! ledger: resolving an id that does not exist is a silent no-op, and an
//! entry that already reached a terminal state is never overwritten (the
//! reconciler and the tab-closure path are mutually exclusive in practice,
//! but both check before writing).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::storage::{JsonStore, StorageError};

/// Storage key for the access log.
pub const ACCESS_LOG_KEY: &str = "accessLogs";

/// Lifecycle state of an interception.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessAction {
    /// Interception happened; no user decision yet.
    Pending,
    /// User granted themselves access for a duration.
    Allowed,
    /// User chose to stay blocked.
    Blocked,
    /// Tab closed without any choice being made.
    Closed,
}

impl AccessAction {
    /// Returns `true` for the three terminal states.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// One intercepted navigation and its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessLogEntry {
    /// Unique id, `<epoch-millis>_<tab-id>` at interception time.
    pub id: String,
    /// When the interception happened.
    pub timestamp: DateTime<Utc>,
    /// The destination URL that was intercepted.
    pub url: String,
    /// Lifecycle state.
    pub action: AccessAction,
    /// Minutes granted; present exactly when `action == Allowed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
}

/// Compose a log id from interception time and the originating tab.
///
/// Uniqueness only needs to hold well enough to key the trace buffer and
/// the log entry; two interceptions for the same tab in the same
/// millisecond would collide, which in practice does not happen for
/// top-level navigations.
#[must_use]
pub fn log_id(now: DateTime<Utc>, tab_id: u32) -> String {
    format!("{}_{}", now.timestamp_millis(), tab_id)
}

/// Durable append-then-patch store for the access log.
pub struct AccessLogStore {
    store: JsonStore,
    // Serializes read-modify-write cycles over the whole list.
    lock: Mutex<()>,
}

impl AccessLogStore {
    /// Create a store over the given state-file directory.
    #[must_use]
    pub fn new(store: JsonStore) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
        }
    }

    fn load_raw(&self) -> Vec<AccessLogEntry> {
        match self.store.read::<Vec<AccessLogEntry>>(ACCESS_LOG_KEY) {
            Ok(Some(entries)) => entries,
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "failed to read access log, treating as empty");
                Vec::new()
            }
        }
    }

    /// Append a new `Pending` entry for an interception.
    ///
    /// # Errors
    ///
    /// Returns an error if the updated log cannot be persisted.
    pub async fn append_pending(
        &self,
        id: &str,
        url: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load_raw();
        entries.push(AccessLogEntry {
            id: id.to_string(),
            timestamp: now,
            url: url.to_string(),
            action: AccessAction::Pending,
            duration: None,
        });
        self.store.write(ACCESS_LOG_KEY, &entries)?;
        debug!(id, url, "pending log entry appended");
        Ok(())
    }

    /// Resolve the entry with `id` to a terminal state.
    ///
    /// Returns `true` if an entry was updated. A missing id or an entry
    /// that already reached a terminal state is a no-op (`false`): the two
    /// writers that call this never overwrite each other's outcome.
    /// `duration` is recorded only when resolving to `Allowed`.
    pub async fn resolve(&self, id: &str, action: AccessAction, duration: Option<u32>) -> bool {
        debug_assert!(action.is_terminal(), "resolve() takes a terminal action");
        let _guard = self.lock.lock().await;
        let mut entries = self.load_raw();

        let Some(entry) = entries.iter_mut().find(|e| e.id == id) else {
            debug!(id, "log entry not found on resolve, skipping");
            return false;
        };
        if entry.action.is_terminal() {
            debug!(id, ?entry.action, "log entry already resolved, skipping");
            return false;
        }

        entry.action = action;
        entry.duration = if action == AccessAction::Allowed {
            duration
        } else {
            None
        };

        if let Err(e) = self.store.write(ACCESS_LOG_KEY, &entries) {
            warn!(error = %e, id, "failed to persist log resolution");
            return false;
        }
        debug!(id, ?action, "log entry resolved");
        true
    }

    /// The full journal, oldest first.
    pub async fn all(&self) -> Vec<AccessLogEntry> {
        let _guard = self.lock.lock().await;
        self.load_raw()
    }
}
