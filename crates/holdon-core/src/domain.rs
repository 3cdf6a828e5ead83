//! Hostname normalization and blocked-domain matching.
//!
//! Two different hostname forms are in play here, and the asymmetry is
//! deliberate:
//!
//! - Exemptions are keyed on the **normalized** hostname (leading `www.` /
//!   `m.` stripped), so whitelisting `reddit.com` covers `www.reddit.com`.
//! - The blocked-domain check runs against the **raw** hostname. Suffix
//!   matching already makes `www.facebook.com` match `.facebook.com`, so
//!   normalizing there would add nothing and would change which exact-match
//!   comparisons fire.
//!
//! Changing either side to use the other form silently changes the set of
//! hosts that get intercepted; keep the asymmetry.

use url::Url;

/// Apex domains blocked by default. A richer build sources this from the
/// onboarding-selected site list; the engine treats whatever it is handed as
/// fixed for the process lifetime.
pub const DEFAULT_BLOCKED_DOMAINS: &[&str] = &[
    "facebook.com",
    "twitter.com",
    "instagram.com",
    "youtube.com",
    "reddit.com",
    "x.com",
    "linkedin.com",
];

/// Strip a single leading `www.` or `m.` label from a hostname.
///
/// Single pass, not recursive: `www.m.example.com` only loses the leading
/// `www.`. Anything else is returned unchanged.
#[must_use]
pub fn normalize_host(host: &str) -> String {
    if let Some(rest) = host.strip_prefix("www.") {
        rest.to_string()
    } else if let Some(rest) = host.strip_prefix("m.") {
        rest.to_string()
    } else {
        host.to_string()
    }
}

/// Returns `true` if `host` equals `domain` or is a subdomain of it
/// (`host` ends with `"." + domain`).
#[must_use]
pub fn suffix_match(host: &str, domain: &str) -> bool {
    host == domain || host.ends_with(&format!(".{domain}"))
}

/// Extract the hostname from a destination URL.
///
/// Malformed input yields `None`; classification treats that as
/// non-matching rather than erroring, so a bad URL can never wedge a
/// navigation.
#[must_use]
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
}

/// The static set of blocked apex domains.
///
/// Matching runs against the raw (unnormalized) hostname; see the module
/// docs for why.
#[derive(Debug, Clone)]
pub struct BlockedDomains {
    domains: Vec<String>,
}

impl BlockedDomains {
    /// Build a set from an explicit domain list.
    #[must_use]
    pub fn new(domains: Vec<String>) -> Self {
        Self { domains }
    }

    /// Returns the first blocked domain that `raw_host` matches, if any.
    #[must_use]
    pub fn matched(&self, raw_host: &str) -> Option<&str> {
        self.domains
            .iter()
            .find(|d| suffix_match(raw_host, d))
            .map(String::as_str)
    }

    /// Returns `true` if `raw_host` matches any blocked domain.
    #[must_use]
    pub fn is_blocked(&self, raw_host: &str) -> bool {
        self.matched(raw_host).is_some()
    }

    /// The domains in this set, in match order.
    #[must_use]
    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    /// Number of domains in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.domains.len()
    }

    /// Returns `true` if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

impl Default for BlockedDomains {
    fn default() -> Self {
        Self::new(
            DEFAULT_BLOCKED_DOMAINS
                .iter()
                .map(ToString::to_string)
                .collect(),
        )
    }
}
