use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::PlanLimit;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PlanLimitRequest {
    pub plan_name: String,
    #[serde(default = "default_plan_type")]
    pub plan_type: String,
    #[serde(default = "defaults::database_size_mb")]
    pub database_size_mb: i64,
    #[serde(default = "defaults::max_users")]
    pub max_users: i64,
    #[serde(default = "defaults::storage_mb")]
    pub storage_mb: i64,
    #[serde(default = "defaults::api_requests")]
    pub api_requests: i64,
    #[serde(default = "defaults::realtime_connections")]
    pub realtime_connections: i64,
    #[serde(default = "defaults::realtime_messages")]
    pub realtime_messages: i64,
    #[serde(default = "defaults::edge_functions_invocations")]
    pub edge_functions_invocations: i64,
    #[serde(default = "defaults::edge_functions_execution_time_hours")]
    pub edge_functions_execution_time_hours: i64,
    #[serde(default = "defaults::is_active")]
    pub is_active: bool,
}

fn default_plan_type() -> String {
    "monthly".to_string()
}

mod defaults {
    pub fn database_size_mb() -> i64 {
        500
    }
    pub fn max_users() -> i64 {
        50_000
    }
    pub fn storage_mb() -> i64 {
        1_000
    }
    pub fn api_requests() -> i64 {
        500_000
    }
    pub fn realtime_connections() -> i64 {
        500
    }
    pub fn realtime_messages() -> i64 {
        2_000_000
    }
    pub fn edge_functions_invocations() -> i64 {
        500_000
    }
    pub fn edge_functions_execution_time_hours() -> i64 {
        400
    }
    pub fn is_active() -> bool {
        true
    }
}

impl PlanLimitRequest {
    pub fn limits(&self) -> [(&'static str, i64); 8] {
        [
            ("database_size_mb", self.database_size_mb),
            ("max_users", self.max_users),
            ("storage_mb", self.storage_mb),
            ("api_requests", self.api_requests),
            ("realtime_connections", self.realtime_connections),
            ("realtime_messages", self.realtime_messages),
            ("edge_functions_invocations", self.edge_functions_invocations),
            (
                "edge_functions_execution_time_hours",
                self.edge_functions_execution_time_hours,
            ),
        ]
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignPlanRequest {
    pub user_id: Uuid,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlanAssignment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub assigned_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, ToSchema)]
pub struct PlanLimitList {
    pub items: Vec<PlanLimit>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omitted_limits_use_plan_defaults() {
        let req: PlanLimitRequest = serde_json::from_str(r#"{"plan_name":"Starter"}"#).unwrap();
        assert_eq!(req.plan_type, "monthly");
        assert_eq!(req.storage_mb, 1_000);
        assert_eq!(req.edge_functions_execution_time_hours, 400);
        assert!(req.is_active);
    }
}
