//! User Management API
//!
//! REST server for user accounts with JWT sessions, role guards and
//! ownership checks.
//!
//! Author: hephaex@gmail.com

pub mod audit;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

#[cfg(feature = "test-utils")]
pub mod testing;

use axum::{http::HeaderValue, middleware as axum_middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers::{addresses, auth as auth_handlers, health, internships, users};
use crate::middleware::security_headers_middleware;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "User Management API",
        description = "User accounts with JWT sessions, role guards and ownership checks"
    ),
    paths(
        health::health_check,
        health::readiness_check,
        auth_handlers::register_handler,
        auth_handlers::login_handler,
        auth_handlers::refresh_handler,
        auth_handlers::me_handler,
        users::list_users,
        users::get_user,
        users::update_user,
        users::delete_user,
        users::list_user_addresses,
        addresses::get_address,
        internships::create_internship,
        internships::list_internships,
    ),
    components(schemas(
        error::ErrorBody,
        health::HealthResponse,
        health::ReadinessResponse,
        auth::RegisterRequest,
        auth::LoginRequest,
        auth::RefreshRequest,
        auth::AuthResponse,
        auth::UserInfo,
        auth::UpdateUserRequest,
        auth_handlers::RegisterResponse,
        addresses::AddressInfo,
        internships::CreateInternshipRequest,
        internships::InternshipInfo,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Liveness and readiness"),
        (name = "auth", description = "Registration, login and token refresh"),
        (name = "users", description = "User accounts"),
        (name = "addresses", description = "User addresses"),
        (name = "internships", description = "Internships and their mentors"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(allowed)
}

/// Build the full application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .nest("/api/v1", routes::api_routes(&state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(axum_middleware::from_fn(security_headers_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
