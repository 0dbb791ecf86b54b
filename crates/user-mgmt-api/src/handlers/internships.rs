//! Internship handlers
//!
//! Creating an internship is ADMIN-only (enforced by the route layer);
//! listing one user's internships is subject to the ownership check.

use super::json_body;
use crate::audit::ClientInfo;
use crate::auth::{authorize_owner, AuthContext};
use crate::error::{AppError, ErrorBody};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use user_mgmt_core::InternshipRecord;
use utoipa::ToSchema;

/// Internship creation request
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInternshipRequest {
    #[serde(default)]
    pub mentor_name: String,
    pub joined_date: Option<NaiveDate>,
    pub completion_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_certified: bool,
}

/// Internship response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InternshipInfo {
    pub id: String,
    pub user_id: String,
    pub mentor_name: String,
    pub joined_date: NaiveDate,
    pub completion_date: Option<NaiveDate>,
    pub is_certified: bool,
}

impl From<InternshipRecord> for InternshipInfo {
    fn from(internship: InternshipRecord) -> Self {
        Self {
            id: internship.id,
            user_id: internship.user_id,
            mentor_name: internship.mentor_name,
            joined_date: internship.joined_date,
            completion_date: internship.completion_date,
            is_certified: internship.is_certified,
        }
    }
}

fn build_internship(user_id: &str, request: CreateInternshipRequest) -> Result<InternshipRecord, AppError> {
    let mentor_name = request.mentor_name.trim();
    let joined_date = match request.joined_date {
        Some(date) if !mentor_name.is_empty() => date,
        _ => {
            return Err(AppError::BadRequest(
                "Mentor name and joined date are required".to_string(),
            ))
        }
    };

    if request.completion_date.is_some_and(|done| done < joined_date) {
        return Err(AppError::BadRequest(
            "Completion date cannot precede joined date".to_string(),
        ));
    }

    Ok(InternshipRecord {
        completion_date: request.completion_date,
        is_certified: request.is_certified,
        ..InternshipRecord::new(user_id, mentor_name, joined_date)
    })
}

/// Record an internship for a user
#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/internship",
    tag = "internships",
    params(
        ("id" = String, Path, description = "User ID")
    ),
    request_body = CreateInternshipRequest,
    responses(
        (status = 201, description = "Internship created", body = InternshipInfo),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 403, description = "Insufficient permissions", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_internship(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    request: Result<Json<CreateInternshipRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let request = json_body(request, "Invalid internship request")?;
    let internship = build_internship(&id, request)?;

    if state.store.find_by_id(&id).await?.is_none() {
        return Err(AppError::NotFound("User".to_string()));
    }

    let internship = state.store.create_internship(internship).await?;
    tracing::info!(
        user_id = %id,
        internship_id = %internship.id,
        created_by = %ctx.user_id,
        "Internship created"
    );

    Ok((StatusCode::CREATED, Json(InternshipInfo::from(internship))))
}

/// List the internships held by a user
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/internship",
    tag = "internships",
    params(
        ("id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Internships held by the user", body = Vec<InternshipInfo>),
        (status = 403, description = "Not the owner", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_internships(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    client: ClientInfo,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    authorize_owner(&ctx, &id, &format!("/api/v1/users/{id}/internship"), &client)?;

    if state.store.find_by_id(&id).await?.is_none() {
        return Err(AppError::NotFound("User".to_string()));
    }

    let internships: Vec<InternshipInfo> = state
        .store
        .list_internships(&id)
        .await?
        .into_iter()
        .map(InternshipInfo::from)
        .collect();

    Ok(Json(internships))
}
