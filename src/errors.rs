use crate::services::catalog_service::CatalogError;
use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// A lightweight wrapper for general errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    /// Shortcut for 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = self.status.as_u16(), "{}", self.message);
        }

        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::CarouselNotFound(_)
            | CatalogError::ImageNotFound(_)
            | CatalogError::PlacementNotFound(_) => AppError::not_found(err.to_string()),
            CatalogError::Validation { .. } => AppError::bad_request(err.to_string()),
            CatalogError::Sqlx(_) | CatalogError::Io(_) => AppError::internal(err.to_string()),
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::new(err.status(), err.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_errors_map_to_status() {
        let cases = [
            (CatalogError::CarouselNotFound(1), StatusCode::NOT_FOUND),
            (CatalogError::ImageNotFound(1), StatusCode::NOT_FOUND),
            (CatalogError::PlacementNotFound(1), StatusCode::NOT_FOUND),
            (
                CatalogError::Validation {
                    field: "title",
                    reason: "too long".into(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                CatalogError::Sqlx(sqlx::Error::PoolTimedOut),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status, status);
        }
    }

    #[test]
    fn test_validation_message_names_field() {
        let err = AppError::from(CatalogError::Validation {
            field: "identifier",
            reason: "must be at most 256 characters".into(),
        });
        assert_eq!(
            err.message,
            "invalid identifier: must be at most 256 characters"
        );
    }
}
