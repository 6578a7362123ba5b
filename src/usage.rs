//! Usage-versus-limit arithmetic for the plan usage report.

use serde::Serialize;
use utoipa::ToSchema;

pub const WARNING_PERCENT: f64 = 80.0;
pub const DANGER_PERCENT: f64 = 90.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UsageStatus {
    Normal,
    Warning,
    Danger,
}

/// Ceilings a plan grants. Missing plans fall back to [`PlanQuota::default`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct PlanQuota {
    pub database_size_mb: i64,
    pub max_users: i64,
    pub storage_mb: i64,
    pub api_requests: i64,
    pub realtime_connections: i64,
    pub realtime_messages: i64,
}

impl Default for PlanQuota {
    fn default() -> Self {
        Self {
            database_size_mb: 500,
            max_users: 50_000,
            storage_mb: 1_000,
            api_requests: 500_000,
            realtime_connections: 500,
            realtime_messages: 2_000_000,
        }
    }
}

impl PlanQuota {
    /// Replace non-positive ceilings with the defaults, so a half-filled
    /// plan row never produces a divide-by-zero report.
    pub fn or_defaults(self) -> Self {
        let d = Self::default();
        let pick = |v: i64, fallback: i64| if v > 0 { v } else { fallback };
        Self {
            database_size_mb: pick(self.database_size_mb, d.database_size_mb),
            max_users: pick(self.max_users, d.max_users),
            storage_mb: pick(self.storage_mb, d.storage_mb),
            api_requests: pick(self.api_requests, d.api_requests),
            realtime_connections: pick(self.realtime_connections, d.realtime_connections),
            realtime_messages: pick(self.realtime_messages, d.realtime_messages),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct UsageMetric {
    pub used: i64,
    pub limit: i64,
    pub percentage: f64,
    pub status: UsageStatus,
    pub display: String,
    /// False when this service cannot observe the figure and reports zero.
    pub measured: bool,
}

impl UsageMetric {
    pub fn measured(used: i64, limit: i64) -> Self {
        let percentage = usage_percentage(used, limit);
        Self {
            used,
            limit,
            percentage: (percentage * 10.0).round() / 10.0,
            status: usage_status(percentage),
            display: format!("{} / {}", format_number(used), format_number(limit)),
            measured: true,
        }
    }

    pub fn unmeasured(limit: i64) -> Self {
        Self {
            measured: false,
            ..Self::measured(0, limit)
        }
    }
}

/// `used / limit` as a percentage, capped at 100. A zero limit reads as 0 %.
pub fn usage_percentage(used: i64, limit: i64) -> f64 {
    if limit <= 0 {
        return 0.0;
    }
    let pct = used.max(0) as f64 / limit as f64 * 100.0;
    pct.min(100.0)
}

pub fn usage_status(percentage: f64) -> UsageStatus {
    if percentage >= DANGER_PERCENT {
        UsageStatus::Danger
    } else if percentage >= WARNING_PERCENT {
        UsageStatus::Warning
    } else {
        UsageStatus::Normal
    }
}

/// Compact counts: `1_500` -> `"1.5K"`, `2_000_000` -> `"2.0M"`.
pub fn format_number(n: i64) -> String {
    let v = n as f64;
    if n >= 1_000_000 {
        format!("{:.1}M", v / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", v / 1_000.0)
    } else {
        n.to_string()
    }
}

pub fn bytes_to_mb(bytes: u64) -> i64 {
    (bytes / (1024 * 1024)) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_is_capped() {
        assert_eq!(usage_percentage(50, 200), 25.0);
        assert_eq!(usage_percentage(900, 500), 100.0);
        assert_eq!(usage_percentage(10, 0), 0.0);
        assert_eq!(usage_percentage(-5, 10), 0.0);
    }

    #[test]
    fn status_thresholds() {
        assert_eq!(usage_status(79.9), UsageStatus::Normal);
        assert_eq!(usage_status(80.0), UsageStatus::Warning);
        assert_eq!(usage_status(89.9), UsageStatus::Warning);
        assert_eq!(usage_status(90.0), UsageStatus::Danger);
        assert_eq!(usage_status(100.0), UsageStatus::Danger);
    }

    #[test]
    fn compact_numbers() {
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1_500), "1.5K");
        assert_eq!(format_number(2_000_000), "2.0M");
    }

    #[test]
    fn metric_rounds_and_classifies() {
        let m = UsageMetric::measured(425, 500);
        assert_eq!(m.percentage, 85.0);
        assert_eq!(m.status, UsageStatus::Warning);
        assert_eq!(m.display, "425 / 500");

        let u = UsageMetric::unmeasured(500_000);
        assert!(!u.measured);
        assert_eq!(u.used, 0);
        assert_eq!(u.status, UsageStatus::Normal);
    }

    #[test]
    fn zero_limits_fall_back_to_defaults() {
        let quota = PlanQuota {
            database_size_mb: 0,
            max_users: 10,
            ..PlanQuota::default()
        }
        .or_defaults();
        assert_eq!(quota.database_size_mb, 500);
        assert_eq!(quota.max_users, 10);
        assert_eq!(bytes_to_mb(3 * 1024 * 1024 + 5), 3);
    }
}
