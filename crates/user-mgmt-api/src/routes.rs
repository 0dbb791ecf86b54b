//! API route definitions
//!
//! Author: hephaex@gmail.com

use crate::auth::{auth_middleware, require_role};
use crate::handlers::{addresses, auth, internships, users};
use crate::state::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use user_mgmt_core::UserRole;

/// Create API v1 routes
///
/// Layering on protected routes, outermost first: auth gate, then the
/// role guard (ADMIN-only routes), then per-handler ownership checks.
pub fn api_routes(state: &AppState) -> Router<Arc<AppState>> {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/refresh", post(auth::refresh_handler));

    // ADMIN only
    let admin_routes = Router::new()
        .route("/users", get(users::list_users))
        .route("/users/:id/internship", post(internships::create_internship))
        .route_layer(middleware::from_fn(require_role(&[UserRole::Admin])));

    // Any authenticated identity; ownership checked in the handlers
    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route(
            "/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/users/:id/addresses", get(users::list_user_addresses))
        .route("/users/:id/internship", get(internships::list_internships))
        .route("/addresses/:id", get(addresses::get_address))
        .merge(admin_routes)
        .route_layer(middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ));

    Router::new().merge(public_routes).merge(protected_routes)
}
