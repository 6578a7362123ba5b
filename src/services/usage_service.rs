use std::future::Future;

use chrono::Utc;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

use crate::{
    dto::usage::{DatabaseUsage, PlanInfo, StorageReport, UsageReport},
    entity::{plan_limits::Model as PlanModel, users},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    services::plan_service::{current_assignment, default_plan},
    state::AppState,
    storage::StorageUsage,
    usage::{PlanQuota, UsageMetric, bytes_to_mb},
};

pub async fn usage_report(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<UsageReport>> {
    let plan = resolve_plan(state, user).await?;
    let quota = plan.quota;

    let db_bytes = measure("database size", async {
        let (bytes,): (i64,) = sqlx::query_as("SELECT pg_database_size(current_database())")
            .fetch_one(&state.pool)
            .await?;
        Ok::<_, AppError>(bytes)
    })
    .await;

    let tables = measure("table count", async {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT count(*) FROM information_schema.tables WHERE table_schema = 'public'",
        )
        .fetch_one(&state.pool)
        .await?;
        Ok::<_, AppError>(count)
    })
    .await;

    let rows = measure("row estimate", async {
        let (rows,): (i64,) =
            sqlx::query_as("SELECT COALESCE(SUM(n_live_tup), 0)::BIGINT FROM pg_stat_user_tables")
                .fetch_one(&state.pool)
                .await?;
        Ok::<_, AppError>(rows)
    })
    .await;

    let active_users = measure("active users", async {
        let count = users::Entity::find()
            .filter(users::Column::IsActive.eq(true))
            .count(&state.orm)
            .await?;
        Ok::<_, AppError>(count as i64)
    })
    .await;

    let storage = match state.storage.usage().await {
        Ok(usage) => usage,
        Err(err) => {
            tracing::warn!(error = %err, "could not measure storage usage");
            StorageUsage::default()
        }
    };

    let report = UsageReport {
        database: DatabaseUsage {
            size_mb: UsageMetric::measured(bytes_to_mb(db_bytes.max(0) as u64), quota.database_size_mb),
            tables,
            rows,
        },
        users: UsageMetric::measured(active_users, quota.max_users),
        storage: StorageReport {
            used_mb: UsageMetric::measured(bytes_to_mb(storage.bytes), quota.storage_mb),
            files: storage.files as i64,
        },
        api_requests: UsageMetric::unmeasured(quota.api_requests),
        realtime_connections: UsageMetric::unmeasured(quota.realtime_connections),
        realtime_messages: UsageMetric::unmeasured(quota.realtime_messages),
        plan,
        generated_at: Utc::now(),
    };

    Ok(ApiResponse::success("Usage", report, Some(Meta::empty())))
}

/// Caller's assigned plan, then the active default plan, then built-in limits.
async fn resolve_plan(state: &AppState, user: &AuthUser) -> AppResult<PlanInfo> {
    if let Some((assignment, plan)) = current_assignment(state, user.user_id).await? {
        return Ok(PlanInfo {
            quota: quota_of(&plan),
            plan_name: plan.plan_name,
            plan_type: plan.plan_type,
            source: "assigned".to_string(),
            assigned_at: Some(assignment.assigned_at.with_timezone(&Utc)),
            expires_at: assignment.expires_at.map(|at| at.with_timezone(&Utc)),
        });
    }

    if let Some(plan) = default_plan(state).await? {
        return Ok(PlanInfo {
            quota: quota_of(&plan),
            plan_name: plan.plan_name,
            plan_type: plan.plan_type,
            source: "default_plan".to_string(),
            assigned_at: None,
            expires_at: None,
        });
    }

    Ok(PlanInfo {
        plan_name: "Built-in".to_string(),
        plan_type: "monthly".to_string(),
        source: "built_in".to_string(),
        assigned_at: None,
        expires_at: None,
        quota: PlanQuota::default(),
    })
}

fn quota_of(plan: &PlanModel) -> PlanQuota {
    PlanQuota {
        database_size_mb: plan.database_size_mb,
        max_users: plan.max_users,
        storage_mb: plan.storage_mb,
        api_requests: plan.api_requests,
        realtime_connections: plan.realtime_connections,
        realtime_messages: plan.realtime_messages,
    }
    .or_defaults()
}

/// Run one measurement; a failure is logged and reads as zero.
async fn measure<F>(label: &str, fut: F) -> i64
where
    F: Future<Output = AppResult<i64>>,
{
    match fut.await {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(error = %err, metric = label, "usage measurement failed");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn failed_measurements_read_as_zero() {
        let ok = measure("ok", async { Ok::<_, AppError>(42) }).await;
        let failed = measure("failed", async { Err::<i64, _>(AppError::NotFound) }).await;
        assert_eq!(ok, 42);
        assert_eq!(failed, 0);
    }
}
