//! IPC (Inter-Process Communication) module.
//!
//! Unix socket protocol between the daemon and its clients: the browser
//! shim (navigation hook + interception surface) and the operator CLI.
//! Messages are JSON with a 4-byte big-endian length prefix.

use serde::{Deserialize, Serialize};

use crate::access_log::AccessLogEntry;
use crate::exemption::ExemptionStatus;
use crate::usage::UsageBand;

/// Maximum frame size for IPC messages (1 MiB; payloads are small JSON).
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// IPC request from client to daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IpcRequest {
    /// Ping the daemon.
    Ping,

    /// Get daemon status.
    Status,

    /// A top-level navigation started in some tab.
    NavigationStarted {
        /// Navigation context (tab) id.
        tab_id: u32,
        /// Committed destination URL.
        url: String,
    },

    /// A tab was closed.
    TabRemoved {
        /// Navigation context (tab) id.
        tab_id: u32,
    },

    /// Grant a temporary exemption (the user chose to proceed).
    SetTemporaryWhitelist {
        /// Normalized domain to exempt.
        domain: String,
        /// Duration of the exemption in minutes.
        minutes: u32,
        /// Log entry to resolve as `Allowed`.
        log_id: Option<String>,
    },

    /// Deny access (the user chose to stay away).
    BlockAccess {
        /// Tab showing the interception surface.
        tab_id: u32,
        /// Log entry to resolve as `Blocked`.
        log_id: Option<String>,
    },

    /// Current whitelist with computed expiry flags.
    GetWhitelistStatus,

    /// Decision trace for one navigation, if still buffered.
    GetDebugTrace {
        /// Correlation id the trace was recorded under.
        log_id: String,
    },

    /// The full access log.
    GetAccessLog,

    /// Granted minutes so far today.
    GetUsage,

    /// Shutdown the daemon.
    Shutdown,
}

/// IPC response from daemon to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IpcResponse {
    /// Pong response.
    Pong {
        /// Daemon version.
        version: String,
        /// Daemon uptime in seconds.
        uptime_secs: u64,
    },

    /// Daemon status.
    Status {
        /// Daemon version.
        version: String,
        /// Daemon PID.
        pid: u32,
        /// Uptime in seconds.
        uptime_secs: u64,
        /// Number of domains in the blocked set.
        blocked_domains: u32,
        /// Number of currently valid exemptions.
        active_exemptions: u32,
        /// Number of unresolved intercepts being tracked.
        pending_intercepts: u32,
    },

    /// Verdict for a navigation event.
    Navigation {
        /// Whether the navigation was intercepted.
        blocked: bool,
        /// Where to send the tab instead, when blocked.
        redirect_url: Option<String>,
        /// Correlation id for the decision (present even when allowed, so
        /// the trace can be fetched).
        log_id: Option<String>,
    },

    /// Current whitelist.
    WhitelistStatus {
        /// Entries with computed `expired` flags, in stored order.
        entries: Vec<ExemptionStatus>,
    },

    /// Decision trace lookup result.
    DebugTrace {
        /// The trace, or a not-found message.
        trace: String,
    },

    /// Full access log.
    AccessLog {
        /// Entries, oldest first.
        entries: Vec<AccessLogEntry>,
    },

    /// Daily usage summary.
    Usage {
        /// Granted minutes since local midnight.
        minutes_today: u32,
        /// Long-form rendering ("2 hours 15 minutes").
        formatted: String,
        /// Coarse band for messaging.
        band: UsageBand,
    },

    /// Operation success.
    Ok {
        /// Optional message.
        message: Option<String>,
    },

    /// Operation error.
    Error {
        /// Error code.
        code: ErrorCode,
        /// Error message.
        message: String,
    },
}

/// Error codes for IPC responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Invalid request.
    InvalidRequest,
    /// Internal error.
    InternalError,
    /// Operation not supported.
    NotSupported,
}

/// Frame a message for IPC transport.
///
/// Format: 4-byte big-endian length prefix + JSON payload.
#[must_use]
#[allow(clippy::cast_possible_truncation)] // Frames are capped well below 4GB
pub fn frame_message(message: &[u8]) -> Vec<u8> {
    let len = message.len() as u32;
    let mut framed = Vec::with_capacity(4 + message.len());
    framed.extend_from_slice(&len.to_be_bytes());
    framed.extend_from_slice(message);
    framed
}

/// Parse a framed message length.
///
/// Returns the payload length if a complete length prefix is present.
#[must_use]
pub fn parse_frame_length(buffer: &[u8]) -> Option<usize> {
    if buffer.len() < 4 {
        return None;
    }
    let len = u32::from_be_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]);
    Some(len as usize)
}

/// IPC errors.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    /// Connection failed.
    #[error("failed to connect to daemon: {0}")]
    ConnectionFailed(String),

    /// Daemon not running.
    #[error("daemon is not running")]
    DaemonNotRunning,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Frame exceeds [`MAX_FRAME_SIZE`].
    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge {
        /// Declared payload size.
        size: usize,
        /// Allowed maximum.
        max: usize,
    },

    /// Protocol error.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Timeout.
    #[error("operation timed out")]
    Timeout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_message() {
        let message = b"hello";
        let framed = frame_message(message);

        assert_eq!(framed.len(), 4 + 5);
        assert_eq!(&framed[0..4], &[0, 0, 0, 5]); // Big-endian length
        assert_eq!(&framed[4..], b"hello");
    }

    #[test]
    fn test_parse_frame_length() {
        let framed = frame_message(b"test message");

        assert_eq!(parse_frame_length(&framed), Some(12));
        assert_eq!(parse_frame_length(&[0, 0, 1, 0]), Some(256));
        assert_eq!(parse_frame_length(&[1, 2, 3]), None); // Too short
    }

    #[test]
    fn test_request_serialization() {
        let request = IpcRequest::NavigationStarted {
            tab_id: 7,
            url: "https://reddit.com/".to_string(),
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("navigation_started"));
        assert!(json.contains("reddit.com"));

        let parsed: IpcRequest = serde_json::from_str(&json).unwrap();
        match parsed {
            IpcRequest::NavigationStarted { tab_id, url } => {
                assert_eq!(tab_id, 7);
                assert_eq!(url, "https://reddit.com/");
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn test_response_serialization() {
        let response = IpcResponse::Navigation {
            blocked: true,
            redirect_url: Some("holdon://intercept?blocked=x".to_string()),
            log_id: Some("123_7".to_string()),
        };

        let json = serde_json::to_string(&response).unwrap();
        let parsed: IpcResponse = serde_json::from_str(&json).unwrap();

        match parsed {
            IpcResponse::Navigation {
                blocked,
                redirect_url,
                log_id,
            } => {
                assert!(blocked);
                assert!(redirect_url.is_some());
                assert_eq!(log_id.as_deref(), Some("123_7"));
            }
            _ => panic!("wrong variant"),
        }
    }
}
