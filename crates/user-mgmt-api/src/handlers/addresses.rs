//! Address handlers
//!
//! An address is owned by the user it belongs to; the owner is resolved
//! from the store before the ownership check runs.
//!
//! Author: hephaex@gmail.com

use crate::audit::ClientInfo;
use crate::auth::{authorize_owner, AuthContext};
use crate::error::{AppError, ErrorBody};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use user_mgmt_core::AddressRecord;
use utoipa::ToSchema;

/// Address response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddressInfo {
    pub id: String,
    pub user_id: String,
    pub street: String,
    pub city: String,
    pub country: String,
}

impl From<AddressRecord> for AddressInfo {
    fn from(address: AddressRecord) -> Self {
        Self {
            id: address.id,
            user_id: address.user_id,
            street: address.street,
            city: address.city,
            country: address.country,
        }
    }
}

/// Get an address by id
#[utoipa::path(
    get,
    path = "/api/v1/addresses/{id}",
    tag = "addresses",
    params(
        ("id" = String, Path, description = "Address ID")
    ),
    responses(
        (status = 200, description = "Address found", body = AddressInfo),
        (status = 403, description = "Address belongs to another user", body = ErrorBody),
        (status = 404, description = "Address not found", body = ErrorBody),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_address(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    client: ClientInfo,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let address = state
        .store
        .find_address(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Address".to_string()))?;

    authorize_owner(&ctx, &address.user_id, &format!("/api/v1/addresses/{id}"), &client)?;

    Ok(Json(AddressInfo::from(address)))
}
