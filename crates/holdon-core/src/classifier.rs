//! The blocking decision.
//!
//! [`evaluate`] is the pure core: hostname in, verdict plus audit trace
//! out. [`Classifier`] wraps it with the exemption-store read (and its
//! lazy prune side effect) so every navigation is re-evaluated from
//! persisted state with one call.
//!
//! The decision order is: valid exemptions first (normalized hostname,
//! first match in stored order wins), then the static blocked set (raw
//! hostname), then default-allow. Storage trouble never surfaces as an
//! error here: a navigation decision must always come back, and the safe
//! default is to let the user through.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use crate::domain::{BlockedDomains, normalize_host, suffix_match};
use crate::exemption::{ExemptionEntry, ExemptionStore};

/// Outcome of classifying one hostname.
#[derive(Debug, Clone)]
pub struct Decision {
    /// Whether the navigation should be intercepted.
    pub blocked: bool,
    /// Human-auditable record of how the verdict was reached.
    pub trace: String,
}

/// Pure decision function over an already-loaded exemption list.
///
/// `valid_exemptions` must contain only non-expired entries, in stored
/// order; ties between overlapping entries go to whichever appears first.
#[must_use]
pub fn evaluate(
    raw_host: &str,
    valid_exemptions: &[ExemptionEntry],
    blocked: &BlockedDomains,
    now: DateTime<Utc>,
) -> Decision {
    let mut trace = String::new();
    let domain = normalize_host(raw_host);

    let _ = writeln!(trace, "=== blocking decision for {raw_host} ===");
    let _ = writeln!(trace, "normalized domain: {domain}");
    let _ = writeln!(trace, "valid exemptions: {}", valid_exemptions.len());

    for entry in valid_exemptions {
        let matched = suffix_match(&domain, &entry.domain);
        let _ = writeln!(
            trace,
            "  exemption '{}': match={matched}, {} min left",
            entry.domain,
            entry.minutes_left(now)
        );
        if matched {
            let _ = writeln!(
                trace,
                "verdict: NOT BLOCKED (whitelisted via '{}')",
                entry.domain
            );
            return Decision {
                blocked: false,
                trace,
            };
        }
    }

    // Blocked-list matching deliberately uses the raw hostname; see the
    // domain module docs.
    if let Some(matched) = blocked.matched(raw_host) {
        let _ = writeln!(trace, "  blocked domain '{matched}': match=true");
        let _ = writeln!(trace, "verdict: BLOCKED (matches '{matched}')");
        return Decision {
            blocked: true,
            trace,
        };
    }

    let _ = writeln!(trace, "verdict: NOT BLOCKED (no list match)");
    Decision {
        blocked: false,
        trace,
    }
}

/// Store-backed classifier: owns the blocked set, reads (and prunes) the
/// exemption list on every call.
pub struct Classifier {
    blocked: BlockedDomains,
}

impl Classifier {
    /// Build a classifier over a blocked-domain set.
    #[must_use]
    pub fn new(blocked: BlockedDomains) -> Self {
        Self { blocked }
    }

    /// The blocked-domain set in use.
    #[must_use]
    pub fn blocked_domains(&self) -> &BlockedDomains {
        &self.blocked
    }

    /// Classify `raw_host` against the current persisted exemption set.
    ///
    /// Re-reads storage every time so a freshly restarted process reaches
    /// the same verdict as the one that wrote the state. Exemption-store
    /// read failures degrade to an empty list inside the store (fail-open).
    pub async fn classify(
        &self,
        exemptions: &ExemptionStore,
        raw_host: &str,
        now: DateTime<Utc>,
    ) -> Decision {
        let valid = exemptions.load_valid(now).await;
        evaluate(raw_host, &valid, &self.blocked, now)
    }
}
