//! Daily-usage aggregation over the access log.
//!
//! The dashboard and the friction screen both report how much time the
//! user has already granted themselves today. Only `Allowed` entries
//! count, at the duration the user picked; blocked and abandoned
//! interceptions contribute nothing.

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::access_log::{AccessAction, AccessLogEntry};

/// Coarse band of time already spent, used by the interception surface to
/// scale its messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageBand {
    /// Up to 15 minutes.
    Short,
    /// 16 to 60 minutes.
    Medium,
    /// More than an hour.
    Long,
}

impl UsageBand {
    /// Band for a minute total.
    #[must_use]
    pub fn for_minutes(minutes: u32) -> Self {
        if minutes <= 15 {
            Self::Short
        } else if minutes <= 60 {
            Self::Medium
        } else {
            Self::Long
        }
    }
}

/// Midnight of the current local day, as a UTC instant.
#[must_use]
pub fn local_day_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let local_day = now.with_timezone(&Local).date_naive();
    let Some(naive_midnight) = local_day.and_hms_opt(0, 0, 0) else {
        return now - chrono::Duration::days(1);
    };
    match Local.from_local_datetime(&naive_midnight).earliest() {
        Some(midnight) => midnight.with_timezone(&Utc),
        // A DST gap at midnight; fall back to 24h before now.
        None => now - chrono::Duration::days(1),
    }
}

/// Sum of granted minutes over entries at or after `since`.
#[must_use]
pub fn minutes_since(logs: &[AccessLogEntry], since: DateTime<Utc>) -> u32 {
    logs.iter()
        .filter(|e| e.timestamp >= since && e.action == AccessAction::Allowed)
        .filter_map(|e| e.duration)
        .sum()
}

/// Granted minutes so far today (local midnight boundary).
#[must_use]
pub fn minutes_today(logs: &[AccessLogEntry], now: DateTime<Utc>) -> u32 {
    minutes_since(logs, local_day_start(now))
}

/// Long form: "45 minutes", "2 hours 15 minutes".
#[must_use]
pub fn format_minutes(minutes: u32) -> String {
    let plural = |n: u32, unit: &str| {
        if n == 1 {
            format!("{n} {unit}")
        } else {
            format!("{n} {unit}s")
        }
    };
    if minutes < 60 {
        return plural(minutes, "minute");
    }
    let hours = minutes / 60;
    let rest = minutes % 60;
    if rest == 0 {
        plural(hours, "hour")
    } else {
        format!("{} {}", plural(hours, "hour"), plural(rest, "minute"))
    }
}

/// Compact form: "45m", "2h 15m".
#[must_use]
pub fn format_compact(minutes: u32) -> String {
    if minutes < 60 {
        return format!("{minutes}m");
    }
    let hours = minutes / 60;
    let rest = minutes % 60;
    if rest == 0 {
        format!("{hours}h")
    } else {
        format!("{hours}h {rest}m")
    }
}
