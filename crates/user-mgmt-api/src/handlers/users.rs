//! User management handlers
//!
//! Listing is ADMIN-only (enforced by the route layer). Everything under
//! `/users/:id` is subject to the ownership check on the path id; changing
//! a role additionally requires ADMIN.
//!
//! Author: hephaex@gmail.com

use super::addresses::AddressInfo;
use super::json_body;
use crate::audit::ClientInfo;
use crate::auth::{authorize_owner, AuthContext, UpdateUserRequest, UserInfo};
use crate::error::{AppError, ErrorBody};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use std::sync::Arc;

/// List all users
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "users",
    responses(
        (status = 200, description = "All users", body = Vec<UserInfo>),
        (status = 401, description = "Access token is required", body = ErrorBody),
        (status = 403, description = "Insufficient permissions", body = ErrorBody),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_users(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let users: Vec<UserInfo> = state
        .store
        .list_users()
        .await?
        .iter()
        .map(UserInfo::from)
        .collect();

    Ok(Json(users))
}

/// Get a user by id
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    tag = "users",
    params(
        ("id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User found", body = UserInfo),
        (status = 403, description = "Not the owner", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    client: ClientInfo,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    authorize_owner(&ctx, &id, &format!("/api/v1/users/{id}"), &client)?;

    Ok(Json(state.sessions.get_user(&id).await?))
}

/// Update a user account
///
/// Absent fields are left unchanged. Only an ADMIN may change a role.
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    tag = "users",
    params(
        ("id" = String, Path, description = "User ID")
    ),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserInfo),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 403, description = "Not the owner, or role change by a non-admin", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody),
        (status = 409, description = "Email already in use", body = ErrorBody),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    client: ClientInfo,
    Path(id): Path<String>,
    request: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    authorize_owner(&ctx, &id, &format!("/api/v1/users/{id}"), &client)?;

    let request = json_body(request, "Invalid update request")?;
    let user = state.sessions.update_user(&id, request, &ctx, &client).await?;

    Ok(Json(user))
}

/// Delete a user and everything it owns
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    tag = "users",
    params(
        ("id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 403, description = "Not the owner", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    client: ClientInfo,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    authorize_owner(&ctx, &id, &format!("/api/v1/users/{id}"), &client)?;

    if !state.store.delete_user(&id).await? {
        return Err(AppError::NotFound("User".to_string()));
    }

    tracing::info!(user_id = %id, deleted_by = %ctx.user_id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// List the addresses owned by a user
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/addresses",
    tag = "users",
    params(
        ("id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Addresses owned by the user", body = Vec<AddressInfo>),
        (status = 403, description = "Not the owner", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_user_addresses(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    client: ClientInfo,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    authorize_owner(&ctx, &id, &format!("/api/v1/users/{id}/addresses"), &client)?;

    if state.store.find_by_id(&id).await?.is_none() {
        return Err(AppError::NotFound("User".to_string()));
    }

    let addresses: Vec<AddressInfo> = state
        .store
        .list_addresses(&id)
        .await?
        .into_iter()
        .map(AddressInfo::from)
        .collect();

    Ok(Json(addresses))
}
