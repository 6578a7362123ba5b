use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::usage::{PlanQuota, UsageMetric};

#[derive(Debug, Serialize, ToSchema)]
pub struct PlanInfo {
    pub plan_name: String,
    pub plan_type: String,
    /// Where the limits came from: `assigned`, `default_plan` or `built_in`.
    pub source: String,
    pub assigned_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub quota: PlanQuota,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DatabaseUsage {
    pub size_mb: UsageMetric,
    pub tables: i64,
    pub rows: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StorageReport {
    pub used_mb: UsageMetric,
    pub files: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UsageReport {
    pub plan: PlanInfo,
    pub database: DatabaseUsage,
    pub users: UsageMetric,
    pub storage: StorageReport,
    pub api_requests: UsageMetric,
    pub realtime_connections: UsageMetric,
    pub realtime_messages: UsageMetric,
    pub generated_at: DateTime<Utc>,
}
