//! API handlers
//!
//! Author: hephaex@gmail.com

pub mod addresses;
pub mod auth;
pub mod health;
pub mod internships;
pub mod users;

use crate::error::AppError;
use axum::{extract::rejection::JsonRejection, Json};
use tracing::debug;

/// Unwrap a JSON body, turning axum's rejection into the standard error shape
///
/// The client only ever sees `message`; the deserializer's own text goes to
/// the debug log.
pub(crate) fn json_body<T>(
    body: Result<Json<T>, JsonRejection>,
    message: &'static str,
) -> Result<T, AppError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        debug!(detail = %rejection.body_text(), "Rejected request body");
        AppError::BadRequest(message.to_string())
    })
}
