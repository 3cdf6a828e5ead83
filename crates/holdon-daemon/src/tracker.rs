//! Per-tab intercept bookkeeping.
//!
//! Maps an open navigation context (tab) to its pending log entry so the
//! tab-closure path can tell "closed without choosing" apart from "already
//! resolved". Deliberately transient: it only needs to span the friction
//! screen's own lifetime, so losing it on daemon restart is acceptable and
//! it must never be treated as a durable source of truth.

use std::collections::HashMap;

/// An interception awaiting the user's decision.
#[derive(Debug, Clone)]
pub struct PendingIntercept {
    /// Log entry / trace correlation id.
    pub log_id: String,
    /// The URL the user was headed to.
    pub original_url: String,
    /// Whether a resolution message already arrived for this intercept.
    pub resolved: bool,
}

/// In-memory map from tab id to its pending intercept.
#[derive(Debug, Default)]
pub struct InterceptTracker {
    tabs: HashMap<u32, PendingIntercept>,
}

impl InterceptTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a fresh interception for `tab_id`, replacing any stale entry.
    pub fn register(&mut self, tab_id: u32, log_id: &str, original_url: &str) {
        self.tabs.insert(
            tab_id,
            PendingIntercept {
                log_id: log_id.to_string(),
                original_url: original_url.to_string(),
                resolved: false,
            },
        );
    }

    /// Mark the intercept for `tab_id` resolved. Returns `false` if the
    /// tab is not being tracked.
    pub fn mark_resolved(&mut self, tab_id: u32) -> bool {
        match self.tabs.get_mut(&tab_id) {
            Some(entry) => {
                entry.resolved = true;
                true
            }
            None => false,
        }
    }

    /// Mark whichever tracked intercept carries `log_id` resolved.
    pub fn mark_resolved_by_log_id(&mut self, log_id: &str) -> bool {
        for entry in self.tabs.values_mut() {
            if entry.log_id == log_id {
                entry.resolved = true;
                return true;
            }
        }
        false
    }

    /// Stop tracking `tab_id`, returning its entry for the closure path.
    pub fn remove(&mut self, tab_id: u32) -> Option<PendingIntercept> {
        self.tabs.remove(&tab_id)
    }

    /// Look up the intercept for `tab_id`.
    #[must_use]
    pub fn get(&self, tab_id: u32) -> Option<&PendingIntercept> {
        self.tabs.get(&tab_id)
    }

    /// Number of tracked intercepts still awaiting a decision.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.tabs.values().filter(|e| !e.resolved).count()
    }

    /// Total number of tracked intercepts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    /// Returns `true` if nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_remove_round_trips() {
        let mut tracker = InterceptTracker::new();
        tracker.register(7, "L1", "https://reddit.com/");

        let entry = tracker.remove(7).unwrap();
        assert_eq!(entry.log_id, "L1");
        assert!(!entry.resolved);
        assert!(tracker.remove(7).is_none());
    }

    #[test]
    fn reregistering_a_tab_replaces_the_entry() {
        let mut tracker = InterceptTracker::new();
        tracker.register(7, "L1", "https://reddit.com/");
        tracker.register(7, "L2", "https://x.com/");

        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.get(7).unwrap().log_id, "L2");
    }

    #[test]
    fn pending_count_excludes_resolved() {
        let mut tracker = InterceptTracker::new();
        tracker.register(1, "L1", "https://reddit.com/");
        tracker.register(2, "L2", "https://x.com/");
        assert!(tracker.mark_resolved(1));
        assert!(!tracker.mark_resolved(99));

        assert_eq!(tracker.pending_count(), 1);
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn resolve_by_log_id_finds_the_owner() {
        let mut tracker = InterceptTracker::new();
        tracker.register(1, "L1", "https://reddit.com/");

        assert!(tracker.mark_resolved_by_log_id("L1"));
        assert!(!tracker.mark_resolved_by_log_id("L9"));
        assert!(tracker.get(1).unwrap().resolved);
    }
}
