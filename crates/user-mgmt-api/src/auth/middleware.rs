/// Authentication gate for protected routes
///
/// Extracts the bearer token from the Authorization header, validates it
/// with the access-token secret and attaches an [`AuthContext`] to the
/// request extensions. The gate behaves identically for every route it
/// protects.
use super::error::AuthError;
use super::jwt::{access_secret, validate_access_token, AccessClaims};
use crate::audit::{audit_log, AuditEvent, ClientInfo};
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use user_mgmt_core::{AuthConfig, UserRole};

/// Validated identity for the current request
///
/// Added to request extensions by [`auth_middleware`]; extract it in
/// handlers with `Extension<AuthContext>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Subject id
    pub user_id: String,
    /// Display name
    pub name: String,
    pub email: String,
    /// Role copied into the token at issuance
    pub role: UserRole,
    /// Token id
    pub jti: String,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl From<AccessClaims> for AuthContext {
    fn from(claims: AccessClaims) -> Self {
        Self {
            user_id: claims.sub,
            name: claims.name,
            email: claims.email,
            role: claims.role,
            jti: claims.jti,
        }
    }
}

/// Bearer token from the Authorization header, if any
///
/// A header that is present but not of the form `Bearer <token>` counts as
/// no token at all.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();

    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

/// Authentication middleware that requires a valid access token
///
/// 1. No bearer token: 401, the next handler is never called
/// 2. Access secret not configured: 500
/// 3. Token fails validation: 403
/// 4. Otherwise the [`AuthContext`] is attached and the request proceeds
///
/// # Usage
///
/// ```ignore
/// use axum::{Router, routing::get, middleware};
/// use user_mgmt_api::auth::auth_middleware;
///
/// let app = Router::new()
///     .route("/protected", get(protected_handler))
///     .route_layer(middleware::from_fn_with_state(auth_config, auth_middleware));
/// ```
pub async fn auth_middleware(
    State(config): State<Arc<AuthConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(request.headers()).ok_or(AuthError::Unauthenticated)?;

    if access_secret(&config).is_err() {
        return Err(AuthError::ServiceMisconfigured);
    }

    let claims = match validate_access_token(&config, token) {
        Ok(claims) => claims,
        Err(e) => {
            audit_log(&AuditEvent::InvalidToken {
                reason: e.to_string(),
                client: ClientInfo::from_headers(request.headers()),
            });
            return Err(AuthError::from(e));
        }
    };

    request.extensions_mut().insert(AuthContext::from(claims));

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{issue_access_token, issue_refresh_token, Identity};
    use axum::{
        http::{Request as HttpRequest, StatusCode},
        middleware,
        routing::get,
        Extension, Router,
    };
    use tower::ServiceExt;

    fn config() -> Arc<AuthConfig> {
        Arc::new(AuthConfig::with_secrets("access-secret", "refresh-secret"))
    }

    fn app(config: Arc<AuthConfig>) -> Router {
        Router::new()
            .route(
                "/protected",
                get(|Extension(ctx): Extension<AuthContext>| async move { ctx.user_id }),
            )
            .route_layer(middleware::from_fn_with_state(config, auth_middleware))
    }

    fn request(auth: Option<&str>) -> HttpRequest<Body> {
        let mut builder = HttpRequest::builder().uri("/protected");
        if let Some(value) = auth {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn token(config: &AuthConfig) -> String {
        issue_access_token(
            config,
            &Identity {
                id: "u1".to_string(),
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                role: UserRole::User,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Bearer abc.def".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        headers.insert(header::AUTHORIZATION, "Basic dXNlcg==".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Bearer ".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Bearer".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_auth_context_from_claims() {
        let claims = AccessClaims {
            iss: "user-mgmt-api".to_string(),
            sub: "u1".to_string(),
            jti: "jti-1".to_string(),
            iat: 1000,
            exp: 2000,
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            role: UserRole::Mentor,
        };

        let ctx = AuthContext::from(claims);
        assert_eq!(ctx.user_id, "u1");
        assert_eq!(ctx.role, UserRole::Mentor);
        assert!(!ctx.is_admin());
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthenticated() {
        let response = app(config()).oneshot(request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_token_reaches_handler() {
        let config = config();
        let bearer = format!("Bearer {}", token(&config));

        let response = app(config).oneshot(request(Some(&bearer))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"u1");
    }

    #[tokio::test]
    async fn test_invalid_token_is_forbidden() {
        let response = app(config())
            .oneshot(request(Some("Bearer not-a-jwt")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_refresh_token_is_not_an_access_token() {
        let config = config();
        let refresh = issue_refresh_token(&config, "u1", "ada@example.com").unwrap();
        let bearer = format!("Bearer {refresh}");

        let response = app(config).oneshot(request(Some(&bearer))).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_missing_secret_is_server_error() {
        let bearer = format!("Bearer {}", token(&config()));

        let response = app(Arc::new(AuthConfig::default()))
            .oneshot(request(Some(&bearer)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_missing_token_checked_before_secret() {
        let response = app(Arc::new(AuthConfig::default()))
            .oneshot(request(None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
