use axum::{
    Json,
    extract::{Query, State},
};

use crate::{
    dto::audit::AuditLogList,
    error::AppResult,
    middleware::auth::AdminUser,
    response::ApiResponse,
    routes::params::AuditLogQuery,
    services::audit_service,
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/api/admin/audit-logs",
    params(AuditLogQuery),
    responses(
        (status = 200, description = "Audit trail, newest first", body = ApiResponse<AuditLogList>)
    ),
    tag = "Admin"
)]
pub async fn list_audit_logs(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<AuditLogQuery>,
) -> AppResult<Json<ApiResponse<AuditLogList>>> {
    let resp = audit_service::list_audit_logs(&state, query).await?;
    Ok(Json(resp))
}
