use axum::{
    Json, Router,
    extract::State,
    routing::get,
};

use crate::{
    dto::dashboard::Dashboard,
    error::AppResult,
    middleware::auth::AdminUser,
    response::ApiResponse,
    routes::{audit, categories, orders, plans, products, settings, uploads, users},
    services::dashboard_service,
    state::AppState,
};

/// Everything under `/api/admin`; each handler checks the admin role itself.
pub fn router(body_limit: usize) -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/audit-logs", get(audit::list_audit_logs))
        .nest("/categories", categories::router())
        .nest("/products", products::router())
        .nest("/orders", orders::router())
        .nest("/users", users::router())
        .nest("/settings", settings::router())
        .nest("/plans", plans::router())
        .nest("/uploads", uploads::router(body_limit))
}

#[utoipa::path(
    get,
    path = "/api/admin/dashboard",
    responses(
        (status = 200, description = "Store totals with recent orders and users", body = ApiResponse<Dashboard>),
        (status = 403, description = "Forbidden"),
    ),
    tag = "Admin"
)]
pub async fn dashboard(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> AppResult<Json<ApiResponse<Dashboard>>> {
    let resp = dashboard_service::dashboard(&state).await?;
    Ok(Json(resp))
}
