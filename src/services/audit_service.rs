use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};

use crate::{
    dto::audit::AuditLogList,
    entity::audit_logs::{Column, Entity as AuditLogs},
    error::AppResult,
    models::AuditLog,
    response::{ApiResponse, Meta},
    routes::params::AuditLogQuery,
    services::non_empty,
    state::AppState,
};

/// Newest first, optionally narrowed to one action.
pub async fn list_audit_logs(
    state: &AppState,
    query: AuditLogQuery,
) -> AppResult<ApiResponse<AuditLogList>> {
    let (page, limit, offset) = query.pagination().normalize();

    let mut finder = AuditLogs::find().order_by_desc(Column::CreatedAt);
    if let Some(action) = query.action.as_deref().and_then(non_empty) {
        finder = finder.filter(Column::Action.eq(action));
    }

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(AuditLog::from)
        .collect();

    Ok(ApiResponse::success(
        "Audit logs",
        AuditLogList { items },
        Some(Meta::new(page, limit, total)),
    ))
}
