use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::models::db_operations::DbError;

/// Failures surfaced at the request boundary.
#[derive(Error, Debug)]
pub enum BlogError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Authentication required")]
    Unauthorized,
    #[error("Storage error: {0}")]
    Storage(#[from] DbError),
    #[error("Blocking task failed: {0}")]
    Blocking(#[from] actix_web::error::BlockingError),
}

impl ResponseError for BlogError {
    fn status_code(&self) -> StatusCode {
        match self {
            BlogError::Validation(_) => StatusCode::BAD_REQUEST,
            BlogError::NotFound(_) => StatusCode::NOT_FOUND,
            BlogError::InvalidCredentials | BlogError::Unauthorized => StatusCode::UNAUTHORIZED,
            BlogError::Storage(_) | BlogError::Blocking(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Storage details can carry file paths; keep them in the log only.
        let message = match self {
            BlogError::Storage(e) => {
                log::error!("Storage failure: {}", e);
                "Failed to access blog storage".to_string()
            }
            BlogError::Blocking(e) => {
                log::error!("Blocking task failed: {}", e);
                "Failed to access blog storage".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(json!({ "error": message }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn storage_errors_do_not_leak_paths() {
        let err = BlogError::Storage(DbError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "/srv/content/blog/secret-draft-1.md",
        )));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(!text.contains("/srv/content"));
    }

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(BlogError::Validation("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(BlogError::NotFound("Blog post".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(BlogError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(BlogError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
    }
}
