//! Reconciliation of pending intercepts into terminal outcomes.
//!
//! Three independently timed writers feed one log record: the grant and
//! deny paths here (driven by the friction screen's messages) and the
//! tab-closure path (abandonment). The log store's resolve-only-if-pending
//! rule keeps them from overwriting each other; this module only decides
//! which terminal state applies.

use chrono::Utc;
use holdon_core::access_log::AccessAction;
use holdon_core::domain::normalize_host;
use holdon_core::ipc::{ErrorCode, IpcResponse};
use tracing::{debug, info, warn};

use crate::state::SharedState;

/// Grant a temporary exemption: the user chose to proceed for a duration.
///
/// Writes the exemption first (that is the user-visible effect), then
/// patches the log entry to `Allowed` and marks the granting tab's
/// intercept resolved. The log patch is skip-if-missing: telemetry never
/// blocks the grant.
pub async fn grant(
    state: &SharedState,
    domain: &str,
    minutes: u32,
    log_id: Option<&str>,
) -> IpcResponse {
    if minutes == 0 {
        return IpcResponse::Error {
            code: ErrorCode::InvalidRequest,
            message: "exemption duration must be at least one minute".into(),
        };
    }

    // The surface sends the normalized domain already; normalizing again
    // is harmless and protects against a hand-crafted client.
    let domain = normalize_host(domain);
    let now = Utc::now();

    if let Err(e) = state.exemptions().grant(&domain, minutes, now).await {
        warn!(error = %e, domain, "failed to persist exemption");
        return IpcResponse::Error {
            code: ErrorCode::InternalError,
            message: format!("failed to persist exemption: {e}"),
        };
    }
    info!(domain, minutes, "temporary exemption granted");

    if let Some(id) = log_id {
        state
            .access_log()
            .resolve(id, AccessAction::Allowed, Some(minutes))
            .await;
        let mut inner = state.write().await;
        inner.tracker.mark_resolved_by_log_id(id);
    }

    IpcResponse::Ok {
        message: Some(format!("{domain} whitelisted for {minutes} minutes")),
    }
}

/// Deny access: the user chose to stay away.
///
/// Patches the log entry to `Blocked` and marks the tab resolved so the
/// imminent tab closure is not misread as abandonment. The surface closes
/// its own tab after this reply.
pub async fn deny(state: &SharedState, tab_id: u32, log_id: Option<&str>) -> IpcResponse {
    if let Some(id) = log_id {
        state.access_log().resolve(id, AccessAction::Blocked, None).await;
    }

    let mut inner = state.write().await;
    if inner.tracker.mark_resolved(tab_id) {
        info!(tab_id, "access denied by user choice");
    } else {
        debug!(tab_id, "deny for untracked tab");
    }

    IpcResponse::Ok { message: None }
}

/// A tab went away. If it was showing an unresolved friction screen, the
/// user walked away without choosing: record `Closed`, which the dashboard
/// counts separately from an explicit block.
pub async fn tab_removed(state: &SharedState, tab_id: u32) -> IpcResponse {
    let entry = {
        let mut inner = state.write().await;
        inner.tracker.remove(tab_id)
    };

    if let Some(entry) = entry {
        if !entry.resolved {
            info!(tab_id, log_id = %entry.log_id, "intercept abandoned by tab closure");
            state
                .access_log()
                .resolve(&entry.log_id, AccessAction::Closed, None)
                .await;
        }
    }

    IpcResponse::Ok { message: None }
}
