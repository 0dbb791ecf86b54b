//! Authentication and authorization module
//!
//! - Token issuance and validation (HS256 JWTs, separate access/refresh secrets)
//! - Password hashing with Argon2
//! - Authentication gate middleware
//! - Role and ownership policy
//! - Session service for login, refresh, registration and account updates

pub mod error;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod policy;
pub mod service;

pub use error::AuthError;
pub use jwt::{
    issue_access_token, issue_refresh_token, validate_access_token, validate_refresh_token,
    AccessClaims, Identity, RefreshClaims, TokenClaims, TokenError,
};
pub use middleware::{auth_middleware, bearer_token, AuthContext};
pub use password::{hash_password, validate_password_strength, verify_password, PasswordConfig};
pub use policy::{authorize_owner, check_ownership, ensure_role, require_role};
pub use service::{
    AuthResponse, LoginRequest, RefreshRequest, RegisterRequest, SessionService,
    UpdateUserRequest, UserInfo,
};
