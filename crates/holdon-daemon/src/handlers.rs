//! IPC request handlers.
//!
//! Implements handlers for each IPC request type. Nothing here returns an
//! error for storage trouble on the read side: every handler degrades to a
//! safe default so a navigation decision always comes back.

use chrono::Utc;
use holdon_core::ipc::{IpcRequest, IpcResponse};
use holdon_core::usage::{self, UsageBand};
use tracing::info;

use crate::state::SharedState;
use crate::{monitor, reconciler};

/// Daemon version (from Cargo.toml).
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Dispatch an IPC request to the appropriate handler.
pub async fn dispatch(request: IpcRequest, state: &SharedState) -> IpcResponse {
    match request {
        IpcRequest::Ping => handle_ping(state),
        IpcRequest::Status => handle_status(state).await,
        IpcRequest::NavigationStarted { tab_id, url } => {
            monitor::handle_navigation(state, tab_id, &url).await
        }
        IpcRequest::TabRemoved { tab_id } => reconciler::tab_removed(state, tab_id).await,
        IpcRequest::SetTemporaryWhitelist {
            domain,
            minutes,
            log_id,
        } => reconciler::grant(state, &domain, minutes, log_id.as_deref()).await,
        IpcRequest::BlockAccess { tab_id, log_id } => {
            reconciler::deny(state, tab_id, log_id.as_deref()).await
        }
        IpcRequest::GetWhitelistStatus => handle_whitelist_status(state).await,
        IpcRequest::GetDebugTrace { log_id } => handle_debug_trace(state, &log_id).await,
        IpcRequest::GetAccessLog => handle_access_log(state).await,
        IpcRequest::GetUsage => handle_usage(state).await,
        IpcRequest::Shutdown => handle_shutdown(state),
    }
}

/// Handle ping request.
fn handle_ping(state: &SharedState) -> IpcResponse {
    IpcResponse::Pong {
        version: VERSION.to_string(),
        uptime_secs: state.uptime_secs(),
    }
}

/// Handle status request.
#[allow(clippy::cast_possible_truncation)] // Counts stay far below u32::MAX
async fn handle_status(state: &SharedState) -> IpcResponse {
    let now = Utc::now();
    let active_exemptions = state.exemptions().load_valid(now).await.len() as u32;
    let pending_intercepts = state.read().await.tracker.pending_count() as u32;

    IpcResponse::Status {
        version: VERSION.to_string(),
        pid: std::process::id(),
        uptime_secs: state.uptime_secs(),
        blocked_domains: state.classifier().blocked_domains().len() as u32,
        active_exemptions,
        pending_intercepts,
    }
}

/// Handle whitelist status request.
async fn handle_whitelist_status(state: &SharedState) -> IpcResponse {
    IpcResponse::WhitelistStatus {
        entries: state.exemptions().status(Utc::now()).await,
    }
}

/// Handle debug trace lookup.
async fn handle_debug_trace(state: &SharedState, log_id: &str) -> IpcResponse {
    let inner = state.read().await;
    let trace = inner
        .traces
        .get(log_id)
        .map_or_else(|| format!("No debug trace found for logId: {log_id}"), ToString::to_string);
    IpcResponse::DebugTrace { trace }
}

/// Handle access log dump.
async fn handle_access_log(state: &SharedState) -> IpcResponse {
    IpcResponse::AccessLog {
        entries: state.access_log().all().await,
    }
}

/// Handle daily usage summary.
async fn handle_usage(state: &SharedState) -> IpcResponse {
    let logs = state.access_log().all().await;
    let minutes = usage::minutes_today(&logs, Utc::now());
    IpcResponse::Usage {
        minutes_today: minutes,
        formatted: usage::format_minutes(minutes),
        band: UsageBand::for_minutes(minutes),
    }
}

/// Handle shutdown request.
fn handle_shutdown(state: &SharedState) -> IpcResponse {
    info!("shutdown requested via IPC");
    state.request_shutdown();
    IpcResponse::Ok {
        message: Some("shutting down".to_string()),
    }
}
