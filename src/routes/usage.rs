use axum::{Json, extract::State};

use crate::{
    dto::usage::UsageReport,
    error::AppResult,
    middleware::auth::AdminUser,
    response::ApiResponse,
    services::usage_service,
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/api/usage",
    responses(
        (status = 200, description = "Resource usage against the caller's plan", body = ApiResponse<UsageReport>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Usage"
)]
pub async fn usage(
    State(state): State<AppState>,
    AdminUser(user): AdminUser,
) -> AppResult<Json<ApiResponse<UsageReport>>> {
    let resp = usage_service::usage_report(&state, &user).await?;
    Ok(Json(resp))
}
