//! Temporary domain exemptions and their durable store.
//!
//! An exemption is a time-bounded permission for one domain to bypass
//! blocking. At most one live entry exists per domain: granting again for
//! the same domain replaces the old entry rather than stacking. Expired
//! entries are inert and are lazily pruned whenever the list is read.
//!
//! All mutations are serialized behind an internal mutex because the
//! underlying storage only supports whole-list read-modify-write; two
//! concurrent grants without the lock could silently drop one of them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::storage::{JsonStore, StorageError};

/// Storage key for the exemption list.
pub const WHITELIST_KEY: &str = "temporaryWhitelist";

/// A temporary, expiring permission for one domain to bypass blocking.
///
/// `domain` is the normalized hostname (leading `www.`/`m.` stripped).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExemptionEntry {
    /// Normalized domain the exemption covers (itself plus subdomains).
    pub domain: String,
    /// Instant the exemption stops applying.
    pub expire_time: DateTime<Utc>,
}

impl ExemptionEntry {
    /// Returns `true` if the exemption is still live at `now`.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expire_time
    }

    /// Whole minutes remaining at `now`, rounded up; zero once expired.
    #[must_use]
    pub fn minutes_left(&self, now: DateTime<Utc>) -> i64 {
        let ms = (self.expire_time - now).num_milliseconds();
        if ms <= 0 { 0 } else { (ms + 59_999) / 60_000 }
    }
}

/// Computed view of an exemption for status reporting: the raw entry plus
/// an `expired` flag evaluated at read time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExemptionStatus {
    /// Domain the exemption covers.
    pub domain: String,
    /// Instant the exemption stops applying.
    pub expire_time: DateTime<Utc>,
    /// Whether the entry had already lapsed when the status was computed.
    pub expired: bool,
}

/// Split entries into still-valid ones (stored order preserved) and a count
/// of expired ones.
#[must_use]
pub fn partition_valid(
    entries: Vec<ExemptionEntry>,
    now: DateTime<Utc>,
) -> (Vec<ExemptionEntry>, usize) {
    let total = entries.len();
    let valid: Vec<ExemptionEntry> = entries.into_iter().filter(|e| e.is_valid_at(now)).collect();
    let expired = total - valid.len();
    (valid, expired)
}

/// Durable store for the temporary whitelist.
pub struct ExemptionStore {
    store: JsonStore,
    // Serializes read-modify-write cycles over the whole list.
    lock: Mutex<()>,
}

impl ExemptionStore {
    /// Create a store over the given state-file directory.
    #[must_use]
    pub fn new(store: JsonStore) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
        }
    }

    /// Load the raw stored list. Read failures degrade to an empty list
    /// (fail-open): a broken state file must never start blocking
    /// navigations that an exemption would have let through, and must never
    /// wedge the decision path.
    fn load_raw(&self) -> Vec<ExemptionEntry> {
        match self.store.read::<Vec<ExemptionEntry>>(WHITELIST_KEY) {
            Ok(Some(entries)) => entries,
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "failed to read whitelist, treating as empty");
                Vec::new()
            }
        }
    }

    /// Load the valid (non-expired) exemptions, pruning lapsed entries from
    /// storage as a side effect whenever at least one was dropped.
    pub async fn load_valid(&self, now: DateTime<Utc>) -> Vec<ExemptionEntry> {
        let _guard = self.lock.lock().await;
        let stored = self.load_raw();
        let (valid, expired) = partition_valid(stored, now);
        if expired > 0 {
            debug!(expired, remaining = valid.len(), "pruning lapsed exemptions");
            if let Err(e) = self.store.write(WHITELIST_KEY, &valid) {
                warn!(error = %e, "failed to persist pruned whitelist");
            }
        }
        valid
    }

    /// Grant (or re-grant) an exemption for `domain` lasting `minutes`.
    ///
    /// Any existing entry for the same domain is replaced, keeping the
    /// at-most-one-active-entry-per-domain invariant.
    ///
    /// # Errors
    ///
    /// Returns an error if the updated list cannot be persisted.
    pub async fn grant(
        &self,
        domain: &str,
        minutes: u32,
        now: DateTime<Utc>,
    ) -> Result<ExemptionEntry, StorageError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load_raw();
        entries.retain(|e| e.domain != domain);

        let entry = ExemptionEntry {
            domain: domain.to_string(),
            expire_time: now + chrono::Duration::minutes(i64::from(minutes)),
        };
        entries.push(entry.clone());
        self.store.write(WHITELIST_KEY, &entries)?;
        debug!(domain, minutes, "exemption granted");
        Ok(entry)
    }

    /// Current whitelist with computed `expired` flags, in stored order.
    pub async fn status(&self, now: DateTime<Utc>) -> Vec<ExemptionStatus> {
        let _guard = self.lock.lock().await;
        self.load_raw()
            .into_iter()
            .map(|e| ExemptionStatus {
                expired: !e.is_valid_at(now),
                domain: e.domain,
                expire_time: e.expire_time,
            })
            .collect()
    }
}
