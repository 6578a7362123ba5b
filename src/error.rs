use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::{
    response::{ApiResponse, Meta},
    storage::StorageError,
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Unauthorized {0}")]
    Unauthorized(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Storage error")]
    Storage(#[from] StorageError),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Storage(StorageError::NotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Storage(
                StorageError::Empty
                | StorageError::TooLarge { .. }
                | StorageError::UnsupportedType(_)
                | StorageError::InvalidPath(_)
                | StorageError::ForeignUrl(_),
            ) => StatusCode::BAD_REQUEST,
            AppError::Storage(StorageError::Io(_))
            | AppError::DbError(_)
            | AppError::OrmError(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }

        // Client errors carry the detailed message; server errors stay generic.
        let detail = match &self {
            AppError::Storage(err) if !status.is_server_error() => err.to_string(),
            _ => self.to_string(),
        };

        let body = ApiResponse {
            message: self.to_string(),
            data: Some(ErrorData { error: detail }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_map_to_client_or_server_status() {
        assert_eq!(
            AppError::Storage(StorageError::Empty).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Storage(StorageError::NotFound("images/a.png".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Storage(StorageError::Io(std::io::Error::other("disk"))).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn bad_request_message_includes_reason() {
        let err = AppError::BadRequest("name is required".into());
        assert_eq!(err.to_string(), "Bad Request name is required");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
