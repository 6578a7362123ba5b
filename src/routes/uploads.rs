use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
};

use crate::{
    dto::uploads::{DeleteUploadRequest, DeletedUpload, UploadForm},
    error::{AppError, AppResult},
    middleware::auth::AdminUser,
    response::ApiResponse,
    services::media_service::{self, ImageUpload},
    state::AppState,
    storage::StoredObject,
};

pub fn router(body_limit: usize) -> Router<AppState> {
    Router::new()
        .route("/", post(upload_image).delete(delete_upload))
        .layer(DefaultBodyLimit::max(body_limit))
}

#[utoipa::path(
    post,
    path = "/api/admin/uploads",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Stored image and its public URL", body = ApiResponse<StoredObject>),
        (status = 400, description = "Missing file, empty, too large or not an image")
    ),
    tag = "Uploads"
)]
pub async fn upload_image(
    State(state): State<AppState>,
    AdminUser(user): AdminUser,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<StoredObject>>> {
    let mut folder = None;
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Multipart error: {}", e)))?
    {
        match field.name().unwrap_or("") {
            "file" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read file: {}", e)))?;
                file = Some((file_name, content_type, data));
            }
            "folder" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read folder: {}", e)))?;
                folder = Some(text);
            }
            _ => {}
        }
    }

    let (file_name, content_type, data) = file.ok_or_else(|| {
        AppError::BadRequest("Missing 'file' field in multipart form".to_string())
    })?;

    let upload = ImageUpload {
        folder,
        file_name,
        content_type,
        data: data.to_vec(),
    };
    let resp = media_service::upload_image(&state, &user, upload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/uploads",
    request_body = DeleteUploadRequest,
    responses(
        (status = 200, description = "Removed the object behind the URL", body = ApiResponse<DeletedUpload>),
        (status = 400, description = "Not a storage URL"),
        (status = 404, description = "Object not found")
    ),
    tag = "Uploads"
)]
pub async fn delete_upload(
    State(state): State<AppState>,
    AdminUser(user): AdminUser,
    Json(payload): Json<DeleteUploadRequest>,
) -> AppResult<Json<ApiResponse<DeletedUpload>>> {
    let resp = media_service::delete_upload(&state, &user, &payload.url).await?;
    Ok(Json(resp))
}
