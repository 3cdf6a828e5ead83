//! Bounded buffer of decision traces.
//!
//! Traces are a debugging aid, keyed by log id and kept only for the
//! lifetime of the hosting process. Correlation ids are minted for every
//! navigation and never reused, so an unbounded map would grow forever;
//! the buffer evicts oldest-first past a fixed cap instead.

use std::collections::VecDeque;

/// Default number of traces retained.
pub const DEFAULT_TRACE_CAPACITY: usize = 256;

/// FIFO-evicting map from log id to decision trace.
#[derive(Debug)]
pub struct TraceBuffer {
    capacity: usize,
    entries: VecDeque<(String, String)>,
}

impl TraceBuffer {
    /// Create a buffer retaining at most `capacity` traces.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::new(),
        }
    }

    /// Record the trace for `log_id`, evicting the oldest entry if full.
    pub fn insert(&mut self, log_id: &str, trace: String) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back((log_id.to_string(), trace));
    }

    /// Look up the trace for `log_id`.
    #[must_use]
    pub fn get(&self, log_id: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(id, _)| id == log_id)
            .map(|(_, trace)| trace.as_str())
    }

    /// Number of retained traces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no traces are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for TraceBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_TRACE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_get() {
        let mut buf = TraceBuffer::default();
        buf.insert("L1", "trace one".into());
        assert_eq!(buf.get("L1"), Some("trace one"));
        assert_eq!(buf.get("L2"), None);
    }

    #[test]
    fn oldest_entry_is_evicted_at_capacity() {
        let mut buf = TraceBuffer::new(2);
        buf.insert("L1", "one".into());
        buf.insert("L2", "two".into());
        buf.insert("L3", "three".into());

        assert_eq!(buf.len(), 2);
        assert_eq!(buf.get("L1"), None);
        assert_eq!(buf.get("L3"), Some("three"));
    }
}
