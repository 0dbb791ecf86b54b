//! Authentication API handlers
//!
//! Registration, login and refresh are public; `/auth/me` sits behind the
//! auth gate.
//!
//! Author: hephaex@gmail.com

use super::json_body;
use crate::audit::ClientInfo;
use crate::auth::{AuthContext, AuthResponse, LoginRequest, RefreshRequest, RegisterRequest, UserInfo};
use crate::error::{AppError, ErrorBody};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Registration response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterResponse {
    pub user: UserInfo,
    pub message: String,
}

/// Register a new user account
///
/// New users always get the `user` role.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = RegisterResponse),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 409, description = "Email already in use", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody),
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    client: ClientInfo,
    request: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let request = json_body(request, "Invalid registration request")?;
    let user = state.sessions.register(request, &client).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user,
            message: "Registration successful".to_string(),
        }),
    ))
}

/// Login with email and password
///
/// Unknown email and wrong password get the same 401 response.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Email or password missing", body = ErrorBody),
        (status = 401, description = "Invalid credentials", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody),
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    client: ClientInfo,
    request: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let request = json_body(request, "Invalid login request")?;
    let response = state.sessions.login(request, &client).await?;

    Ok(Json(response))
}

/// Refresh the token pair
///
/// Exchanges a valid refresh token for a new access token and a new
/// refresh token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    tag = "auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Token refreshed successfully", body = AuthResponse),
        (status = 400, description = "Refresh token missing", body = ErrorBody),
        (status = 401, description = "Invalid refresh token", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody),
    )
)]
pub async fn refresh_handler(
    State(state): State<Arc<AppState>>,
    client: ClientInfo,
    request: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let request = json_body(request, "Invalid refresh request")?;
    let response = state.sessions.refresh(request, &client).await?;

    Ok(Json(response))
}

/// Get current user profile
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current user profile", body = UserInfo),
        (status = 401, description = "Access token is required", body = ErrorBody),
        (status = 403, description = "Invalid or expired token", body = ErrorBody),
        (status = 404, description = "User no longer exists", body = ErrorBody),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<impl IntoResponse, AppError> {
    let user_info = state.sessions.get_user(&ctx.user_id).await?;

    Ok(Json(user_info))
}
