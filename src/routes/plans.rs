use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::plans::{AssignPlanRequest, PlanAssignment, PlanLimitList, PlanLimitRequest},
    error::AppResult,
    middleware::auth::AdminUser,
    models::PlanLimit,
    response::ApiResponse,
    services::plan_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_plans).post(create_plan))
        .route("/{id}", get(get_plan).put(update_plan).delete(delete_plan))
        .route("/{id}/assign", post(assign_plan))
}

#[utoipa::path(
    get,
    path = "/api/admin/plans",
    responses(
        (status = 200, description = "Plan limits by name", body = ApiResponse<PlanLimitList>)
    ),
    tag = "Plans"
)]
pub async fn list_plans(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> AppResult<Json<ApiResponse<PlanLimitList>>> {
    let resp = plan_service::list_plans(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/plans/{id}",
    params(("id" = Uuid, Path, description = "Plan ID")),
    responses(
        (status = 200, description = "Get plan", body = ApiResponse<PlanLimit>),
        (status = 404, description = "Plan not found")
    ),
    tag = "Plans"
)]
pub async fn get_plan(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<PlanLimit>>> {
    let resp = plan_service::get_plan(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/plans",
    request_body = PlanLimitRequest,
    responses(
        (status = 200, description = "Create plan", body = ApiResponse<PlanLimit>),
        (status = 400, description = "Invalid or duplicate plan")
    ),
    tag = "Plans"
)]
pub async fn create_plan(
    State(state): State<AppState>,
    AdminUser(user): AdminUser,
    Json(payload): Json<PlanLimitRequest>,
) -> AppResult<Json<ApiResponse<PlanLimit>>> {
    let resp = plan_service::create_plan(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/admin/plans/{id}",
    params(("id" = Uuid, Path, description = "Plan ID")),
    request_body = PlanLimitRequest,
    responses(
        (status = 200, description = "Updated plan", body = ApiResponse<PlanLimit>),
        (status = 400, description = "Invalid or duplicate plan"),
        (status = 404, description = "Plan not found")
    ),
    tag = "Plans"
)]
pub async fn update_plan(
    State(state): State<AppState>,
    AdminUser(user): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<PlanLimitRequest>,
) -> AppResult<Json<ApiResponse<PlanLimit>>> {
    let resp = plan_service::update_plan(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/plans/{id}",
    params(("id" = Uuid, Path, description = "Plan ID")),
    responses(
        (status = 200, description = "Deleted plan"),
        (status = 404, description = "Plan not found")
    ),
    tag = "Plans"
)]
pub async fn delete_plan(
    State(state): State<AppState>,
    AdminUser(user): AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = plan_service::delete_plan(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/plans/{id}/assign",
    params(("id" = Uuid, Path, description = "Plan ID")),
    request_body = AssignPlanRequest,
    responses(
        (status = 200, description = "Plan assigned to user", body = ApiResponse<PlanAssignment>),
        (status = 400, description = "Inactive plan or past expiry"),
        (status = 404, description = "Plan or user not found")
    ),
    tag = "Plans"
)]
pub async fn assign_plan(
    State(state): State<AppState>,
    AdminUser(user): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignPlanRequest>,
) -> AppResult<Json<ApiResponse<PlanAssignment>>> {
    let resp = plan_service::assign_plan(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
