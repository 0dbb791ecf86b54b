//! Authentication and authorization errors
//!
//! Every variant renders as `{ "success": false, "error": ..., "statusCode": ... }`.
//! Messages are fixed strings; the wrapped source errors are only ever
//! written to the log.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use super::jwt::TokenError;
use super::password::PasswordError;
use crate::error::ErrorBody;

#[derive(Debug, Error)]
pub enum AuthError {
    /// No bearer token on a protected route
    #[error("Access token is required")]
    Unauthenticated,

    /// A signing secret is missing at runtime
    #[error("Authentication is not configured")]
    ServiceMisconfigured,

    /// Bearer token failed validation
    #[error("Invalid token: {0}")]
    InvalidToken(#[source] TokenError),

    /// Authenticated, but the role or ownership check failed
    #[error("Insufficient permissions")]
    Forbidden,

    /// Unknown email or wrong password. Deliberately indistinguishable.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Any refresh-flow failure
    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    /// Hashing or token signing failed for a reason other than configuration
    #[error("Internal authentication error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Unauthenticated
            | AuthError::InvalidCredentials
            | AuthError::InvalidRefreshToken => StatusCode::UNAUTHORIZED,
            AuthError::InvalidToken(_) | AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::ServiceMisconfigured | AuthError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Client-facing message
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::Unauthenticated => "Access token is required",
            AuthError::InvalidToken(TokenError::ExpiredToken) => "Access token has expired",
            AuthError::InvalidToken(_) => "Invalid or expired token",
            AuthError::Forbidden => "Insufficient permissions",
            AuthError::InvalidCredentials => "Invalid credentials",
            AuthError::InvalidRefreshToken => "Invalid refresh token",
            AuthError::ServiceMisconfigured | AuthError::Internal(_) => "Internal server error",
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::ExpiredToken | TokenError::MalformedToken => AuthError::InvalidToken(err),
            err if err.is_configuration() => {
                error!(error = %err, "Token configuration error");
                AuthError::ServiceMisconfigured
            }
            other => AuthError::Internal(other.to_string()),
        }
    }
}

impl From<PasswordError> for AuthError {
    fn from(err: PasswordError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Authentication failure");
        }

        (status, Json(ErrorBody::new(status, self.public_message()))).into_response()
    }
}
