//! Role and ownership authorization
//!
//! Consulted after [`auth_middleware`](super::auth_middleware) has attached
//! an [`AuthContext`]. ADMIN satisfies every role and ownership check.

use super::error::AuthError;
use super::middleware::AuthContext;
use crate::audit::{audit_log, AuditEvent, ClientInfo};
use axum::{body::Body, extract::Request, middleware::Next, response::Response};
use user_mgmt_core::UserRole;

/// Type alias for role middleware future
type RoleMiddlewareFuture =
    std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AuthError>> + Send>>;

/// Allow if the context's role is ADMIN or one of `allowed`
///
/// An absent context is `Forbidden`, not `Unauthenticated`: this check runs
/// behind the gate, so a missing context means the route was wired wrong.
pub fn ensure_role(ctx: Option<&AuthContext>, allowed: &[UserRole]) -> Result<(), AuthError> {
    match ctx {
        Some(ctx) if ctx.is_admin() || allowed.contains(&ctx.role) => Ok(()),
        _ => Err(AuthError::Forbidden),
    }
}

/// Allow if the context is ADMIN or its subject owns the resource
pub fn check_ownership(ctx: Option<&AuthContext>, owner_id: &str) -> Result<(), AuthError> {
    match ctx {
        Some(ctx) if ctx.is_admin() || ctx.user_id == owner_id => Ok(()),
        _ => Err(AuthError::Forbidden),
    }
}

/// [`check_ownership`] with an audit record on denial
pub fn authorize_owner(
    ctx: &AuthContext,
    owner_id: &str,
    resource: &str,
    client: &ClientInfo,
) -> Result<(), AuthError> {
    check_ownership(Some(ctx), owner_id).inspect_err(|_| {
        audit_log(&AuditEvent::AccessDenied {
            user_id: Some(ctx.user_id.clone()),
            role: Some(ctx.role),
            resource: resource.to_string(),
            required_role: None,
            client: client.clone(),
        });
    })
}

/// Middleware factory for role-based access control
///
/// # Example
///
/// ```ignore
/// use axum::{Router, routing::get, middleware};
/// use user_mgmt_api::auth::{auth_middleware, require_role};
/// use user_mgmt_core::UserRole;
///
/// let app = Router::new()
///     .route("/users", get(list_users))
///     .route_layer(middleware::from_fn(require_role(&[UserRole::Admin])))
///     .route_layer(middleware::from_fn_with_state(auth_config, auth_middleware));
/// ```
pub fn require_role(
    allowed: &'static [UserRole],
) -> impl Fn(Request<Body>, Next) -> RoleMiddlewareFuture + Clone {
    move |request: Request<Body>, next: Next| {
        Box::pin(async move {
            let ctx = request.extensions().get::<AuthContext>();

            if let Err(e) = ensure_role(ctx, allowed) {
                audit_log(&AuditEvent::AccessDenied {
                    user_id: ctx.map(|c| c.user_id.clone()),
                    role: ctx.map(|c| c.role),
                    resource: request.uri().path().to_string(),
                    required_role: Some(
                        allowed
                            .iter()
                            .map(UserRole::as_str)
                            .collect::<Vec<_>>()
                            .join(","),
                    ),
                    client: ClientInfo::from_headers(request.headers()),
                });

                return Err(e);
            }

            Ok(next.run(request).await)
        })
    }
}
