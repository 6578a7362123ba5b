use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct DeleteUploadRequest {
    pub url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeletedUpload {
    pub bucket: String,
    pub path: String,
}

/// Shape of the multipart form accepted by the upload endpoint (docs only).
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    pub folder: Option<String>,
}
