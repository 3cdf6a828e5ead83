//! Navigation monitoring: classify each navigation start and intercept
//! blocked ones.
//!
//! On a block verdict this appends the `Pending` log entry, registers the
//! tab with the tracker, and hands back the intercept redirect, all before
//! the reply leaves the daemon; the browser shim's only job is to apply
//! the redirect. On an allow verdict there are no side effects beyond the
//! trace buffer.

use chrono::Utc;
use holdon_core::access_log::log_id;
use holdon_core::domain::host_of;
use holdon_core::ipc::IpcResponse;
use tracing::{debug, info, warn};
use url::Url;

use crate::state::SharedState;

/// Build the redirect URL for an interception:
/// `<intercept>?blocked=<url-encoded original>&tabId=<tab>&logId=<id>`.
#[must_use]
pub fn intercept_redirect(intercept_url: &str, original: &str, tab_id: u32, id: &str) -> String {
    match Url::parse(intercept_url) {
        Ok(mut url) => {
            url.query_pairs_mut()
                .append_pair("blocked", original)
                .append_pair("tabId", &tab_id.to_string())
                .append_pair("logId", id);
            url.into()
        }
        // Config validation guarantees a parseable intercept URL; keep a
        // plain fallback rather than panicking on a stale config.
        Err(_) => format!("{intercept_url}?logId={id}"),
    }
}

/// Returns `true` if `dest` points at the interception surface itself:
/// same scheme, host, and path as the configured intercept URL, query
/// ignored. String-prefix matching is not enough here; it would also
/// exempt unrelated URLs that merely share the prefix.
fn is_intercept_destination(intercept_url: &str, dest: &str) -> bool {
    let (Ok(intercept), Ok(dest)) = (Url::parse(intercept_url), Url::parse(dest)) else {
        return false;
    };
    dest.scheme() == intercept.scheme()
        && dest.host_str() == intercept.host_str()
        && dest.path() == intercept.path()
}

/// Handle one navigation-start event.
///
/// The listener can fire repeatedly for one logical navigation (redirect
/// chains re-enter it), so this must be safe to re-run: the redirect
/// target itself is never re-classified, and an allow verdict leaves no
/// state behind.
pub async fn handle_navigation(state: &SharedState, tab_id: u32, dest_url: &str) -> IpcResponse {
    // Our own interception surface must pass untouched or every block
    // would loop forever.
    if is_intercept_destination(state.intercept_url(), dest_url) {
        debug!(tab_id, "navigation to intercept surface, skipping");
        return IpcResponse::Navigation {
            blocked: false,
            redirect_url: None,
            log_id: None,
        };
    }

    let Some(host) = host_of(dest_url) else {
        debug!(tab_id, url = dest_url, "unparseable destination, allowing");
        return IpcResponse::Navigation {
            blocked: false,
            redirect_url: None,
            log_id: None,
        };
    };

    let now = Utc::now();
    let id = log_id(now, tab_id);
    let decision = state
        .classifier()
        .classify(state.exemptions(), &host, now)
        .await;

    {
        let mut inner = state.write().await;
        inner.traces.insert(&id, decision.trace);
    }

    if !decision.blocked {
        debug!(tab_id, host, "navigation allowed");
        return IpcResponse::Navigation {
            blocked: false,
            redirect_url: None,
            log_id: Some(id),
        };
    }

    info!(tab_id, host, log_id = %id, "navigation blocked, intercepting");

    // Best-effort journal entry; a write failure must not stop the
    // interception itself.
    if let Err(e) = state.access_log().append_pending(&id, dest_url, now).await {
        warn!(error = %e, log_id = %id, "failed to journal interception");
    }

    {
        let mut inner = state.write().await;
        inner.tracker.register(tab_id, &id, dest_url);
    }

    let redirect = intercept_redirect(state.intercept_url(), dest_url, tab_id, &id);
    IpcResponse::Navigation {
        blocked: true,
        redirect_url: Some(redirect),
        log_id: Some(id),
    }
}
