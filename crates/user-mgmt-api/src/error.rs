//! API error handling
//!
//! Author: hephaex@gmail.com

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use crate::auth::AuthError;

/// Error response body shared by every failing endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Always false
    pub success: bool,
    /// Human-readable message
    pub error: String,
    /// HTTP status code, repeated in the body
    pub status_code: u16,
}

impl ErrorBody {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
            status_code: status.as_u16(),
        }
    }
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    Auth(AuthError),
    Internal(String),
    Database(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Auth(err) => return err.into_response(),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, format!("{msg} not found")),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Internal(msg) => {
                error!(error = %msg, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AppError::Database(msg) => {
                error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Database operation failed".to_string())
            }
        };

        (status, Json(ErrorBody::new(status, message))).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<user_mgmt_core::CoreError> for AppError {
    fn from(err: user_mgmt_core::CoreError) -> Self {
        use user_mgmt_core::CoreError;

        match err {
            CoreError::NotFound(msg) => AppError::NotFound(msg),
            CoreError::Conflict(msg) => AppError::Conflict(msg),
            CoreError::ValidationError(msg) => AppError::BadRequest(msg),
            CoreError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use user_mgmt_core::CoreError;

    #[test]
    fn test_error_body_shape() {
        let body = ErrorBody::new(StatusCode::UNAUTHORIZED, "Access token is required");
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "success": false,
                "error": "Access token is required",
                "statusCode": 401
            })
        );
    }

    #[test]
    fn test_core_error_mapping() {
        assert!(matches!(
            AppError::from(CoreError::Conflict("Email already in use".into())),
            AppError::Conflict(_)
        ));
        assert!(matches!(
            AppError::from(CoreError::ValidationError("bad".into())),
            AppError::BadRequest(_)
        ));
        assert!(matches!(
            AppError::from(CoreError::DatabaseError("down".into())),
            AppError::Database(_)
        ));
    }

    #[test]
    fn test_server_errors_hide_detail() {
        let response = AppError::Database("password=hunter2 host=db".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
