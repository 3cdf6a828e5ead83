#![allow(clippy::print_stdout)] // CLI output surface

//! Command implementations: render daemon responses for the terminal.

use anyhow::{Result, bail};
use chrono::{DateTime, Local, Utc};
use holdon_core::access_log::AccessAction;
use holdon_core::ipc::{IpcRequest, IpcResponse};
use holdon_core::usage::format_compact;

use crate::client::DaemonClient;

fn local(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

fn unexpected(response: &IpcResponse) -> anyhow::Error {
    match response {
        IpcResponse::Error { code, message } => {
            anyhow::anyhow!("daemon error ({code:?}): {message}")
        }
        other => anyhow::anyhow!("unexpected response: {other:?}"),
    }
}

/// `holdon ping`
pub fn ping(client: &DaemonClient) -> Result<()> {
    match client.request(&IpcRequest::Ping)? {
        IpcResponse::Pong {
            version,
            uptime_secs,
        } => {
            println!("holdon-daemon {version}, up {uptime_secs}s");
            Ok(())
        }
        other => bail!(unexpected(&other)),
    }
}

/// `holdon status`
pub fn status(client: &DaemonClient) -> Result<()> {
    match client.request(&IpcRequest::Status)? {
        IpcResponse::Status {
            version,
            pid,
            uptime_secs,
            blocked_domains,
            active_exemptions,
            pending_intercepts,
        } => {
            println!("holdon-daemon {version} (pid {pid})");
            println!("  uptime:             {uptime_secs}s");
            println!("  blocked domains:    {blocked_domains}");
            println!("  active exemptions:  {active_exemptions}");
            println!("  pending intercepts: {pending_intercepts}");
            Ok(())
        }
        other => bail!(unexpected(&other)),
    }
}

/// `holdon whitelist`
pub fn whitelist(client: &DaemonClient) -> Result<()> {
    match client.request(&IpcRequest::GetWhitelistStatus)? {
        IpcResponse::WhitelistStatus { entries } => {
            if entries.is_empty() {
                println!("no temporary exemptions");
                return Ok(());
            }
            for entry in entries {
                let state = if entry.expired { "expired" } else { "active" };
                println!(
                    "{:<30} until {}  [{state}]",
                    entry.domain,
                    local(entry.expire_time)
                );
            }
            Ok(())
        }
        other => bail!(unexpected(&other)),
    }
}

/// `holdon logs`
pub fn logs(client: &DaemonClient) -> Result<()> {
    match client.request(&IpcRequest::GetAccessLog)? {
        IpcResponse::AccessLog { entries } => {
            if entries.is_empty() {
                println!("no access attempts logged yet");
                return Ok(());
            }
            for (index, entry) in entries.iter().enumerate() {
                let outcome = match (entry.action, entry.duration) {
                    (AccessAction::Allowed, Some(minutes)) => {
                        format!("Allowed ({})", format_compact(minutes))
                    }
                    (action, _) => format!("{action:?}"),
                };
                println!("{}. {}", index + 1, local(entry.timestamp));
                println!("   URL: {}", entry.url);
                println!("   Action: {outcome}");
            }
            Ok(())
        }
        other => bail!(unexpected(&other)),
    }
}

/// `holdon usage`
pub fn usage(client: &DaemonClient) -> Result<()> {
    match client.request(&IpcRequest::GetUsage)? {
        IpcResponse::Usage {
            minutes_today,
            formatted,
            band,
        } => {
            println!("granted today: {formatted} ({minutes_today} min, {band:?})");
            Ok(())
        }
        other => bail!(unexpected(&other)),
    }
}

/// `holdon trace <log-id>`
pub fn trace(client: &DaemonClient, log_id: String) -> Result<()> {
    match client.request(&IpcRequest::GetDebugTrace { log_id })? {
        IpcResponse::DebugTrace { trace } => {
            println!("{trace}");
            Ok(())
        }
        other => bail!(unexpected(&other)),
    }
}

/// `holdon allow <domain> <minutes>` — manual grant, same path the
/// friction screen uses (without a log entry to patch).
pub fn allow(client: &DaemonClient, domain: String, minutes: u32) -> Result<()> {
    let request = IpcRequest::SetTemporaryWhitelist {
        domain,
        minutes,
        log_id: None,
    };
    match client.request(&request)? {
        IpcResponse::Ok { message } => {
            println!("{}", message.unwrap_or_else(|| "ok".to_string()));
            Ok(())
        }
        other => bail!(unexpected(&other)),
    }
}

/// `holdon block <tab-id>` — deny path, as the friction screen drives it.
pub fn block(client: &DaemonClient, tab_id: u32, log_id: Option<String>) -> Result<()> {
    match client.request(&IpcRequest::BlockAccess { tab_id, log_id })? {
        IpcResponse::Ok { .. } => {
            println!("tab {tab_id} marked blocked");
            Ok(())
        }
        other => bail!(unexpected(&other)),
    }
}

/// `holdon kill`
pub fn kill(client: &DaemonClient) -> Result<()> {
    match client.request(&IpcRequest::Shutdown)? {
        IpcResponse::Ok { message } => {
            println!("{}", message.unwrap_or_else(|| "ok".to_string()));
            Ok(())
        }
        other => bail!(unexpected(&other)),
    }
}
