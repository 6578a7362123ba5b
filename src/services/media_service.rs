use crate::{
    audit,
    dto::uploads::DeletedUpload,
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    state::AppState,
    storage::StoredObject,
};

pub const DEFAULT_FOLDER: &str = "images";

/// One file pulled out of a multipart upload form.
#[derive(Debug)]
pub struct ImageUpload {
    pub folder: Option<String>,
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

pub async fn upload_image(
    state: &AppState,
    user: &AuthUser,
    upload: ImageUpload,
) -> AppResult<ApiResponse<StoredObject>> {
    let folder = upload_folder(upload.folder.as_deref());

    let stored = state
        .storage
        .upload(&folder, &upload.file_name, &upload.content_type, &upload.data)
        .await?;

    tracing::info!(path = %stored.path, size = stored.size, "image uploaded");

    audit::record(
        &state.pool,
        user.user_id,
        "image_upload",
        "storage",
        serde_json::json!({ "bucket": stored.bucket, "path": stored.path }),
    )
    .await;

    Ok(ApiResponse::success(
        "Image uploaded",
        stored,
        Some(Meta::empty()),
    ))
}

pub async fn delete_upload(
    state: &AppState,
    user: &AuthUser,
    url: &str,
) -> AppResult<ApiResponse<DeletedUpload>> {
    if url.trim().is_empty() {
        return Err(AppError::BadRequest("url is required".into()));
    }
    let location = state.storage.delete_by_url(url.trim()).await?;

    audit::record(
        &state.pool,
        user.user_id,
        "image_delete",
        "storage",
        serde_json::json!({ "bucket": location.bucket, "path": location.path }),
    )
    .await;

    Ok(ApiResponse::success(
        "Image deleted",
        DeletedUpload {
            bucket: location.bucket,
            path: location.path,
        },
        Some(Meta::empty()),
    ))
}

fn upload_folder(requested: Option<&str>) -> String {
    requested
        .map(|f| f.trim().trim_matches('/'))
        .filter(|f| !f.is_empty())
        .unwrap_or(DEFAULT_FOLDER)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folder_defaults_and_is_trimmed() {
        assert_eq!(upload_folder(None), "images");
        assert_eq!(upload_folder(Some(" / ")), "images");
        assert_eq!(upload_folder(Some("/categories/")), "categories");
    }
}
