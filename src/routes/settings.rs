use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::settings::UpdateSettingsRequest,
    error::AppResult,
    middleware::auth::AdminUser,
    models::AppSettings,
    response::ApiResponse,
    services::settings_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_settings).put(update_settings))
}

#[utoipa::path(
    get,
    path = "/api/admin/settings",
    responses(
        (status = 200, description = "Store settings, defaults when never saved", body = ApiResponse<AppSettings>)
    ),
    tag = "Settings"
)]
pub async fn get_settings(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> AppResult<Json<ApiResponse<AppSettings>>> {
    let resp = settings_service::get_settings(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/admin/settings",
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Saved settings", body = ApiResponse<AppSettings>),
        (status = 400, description = "Invalid currency code or delivery cost")
    ),
    tag = "Settings"
)]
pub async fn update_settings(
    State(state): State<AppState>,
    AdminUser(user): AdminUser,
    Json(payload): Json<UpdateSettingsRequest>,
) -> AppResult<Json<ApiResponse<AppSettings>>> {
    let resp = settings_service::update_settings(&state, &user, payload).await?;
    Ok(Json(resp))
}
