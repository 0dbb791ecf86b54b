//! Security audit logging for authentication events
//!
//! Logins, refreshes, registrations, rejected tokens and denied accesses
//! are logged at INFO level with the "audit" target, so they can be
//! filtered and routed separately from application logs:
//!
//! ```text
//! RUST_LOG=info,audit=info
//! ```
//!
//! Events never carry passwords, password hashes or tokens.
//!
//! Author: hephaex@gmail.com

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tracing::info;
use user_mgmt_core::UserRole;

/// Client metadata attached to every audit event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl ClientInfo {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            ip_address: extract_ip_address(headers),
            user_agent: extract_user_agent(headers),
        }
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ClientInfo {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

/// Security audit events for authentication and authorization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    /// Successful user login
    LoginSuccess {
        user_id: String,
        email: String,
        #[serde(flatten)]
        client: ClientInfo,
    },

    /// Failed login attempt
    LoginFailure {
        email: String,
        reason: String,
        #[serde(flatten)]
        client: ClientInfo,
    },

    /// Token pair rotated from a refresh token
    TokenRefresh {
        user_id: String,
        email: String,
        #[serde(flatten)]
        client: ClientInfo,
    },

    /// Refresh token rejected
    RefreshFailure {
        reason: String,
        #[serde(flatten)]
        client: ClientInfo,
    },

    /// Successful user registration
    RegistrationSuccess {
        user_id: String,
        email: String,
        role: UserRole,
        #[serde(flatten)]
        client: ClientInfo,
    },

    /// Failed registration attempt
    RegistrationFailure {
        email: String,
        reason: String,
        #[serde(flatten)]
        client: ClientInfo,
    },

    /// Account fields changed. `new_role` is set only when the role changed.
    UserUpdated {
        user_id: String,
        updated_by: String,
        fields: Vec<String>,
        new_role: Option<UserRole>,
        #[serde(flatten)]
        client: ClientInfo,
    },

    /// Access denied by a role or ownership check
    AccessDenied {
        user_id: Option<String>,
        role: Option<UserRole>,
        resource: String,
        required_role: Option<String>,
        #[serde(flatten)]
        client: ClientInfo,
    },

    /// Invalid or expired bearer token presented
    InvalidToken {
        reason: String,
        #[serde(flatten)]
        client: ClientInfo,
    },
}

impl AuditEvent {
    fn summary(&self) -> &'static str {
        match self {
            AuditEvent::LoginSuccess { .. } => "Login successful",
            AuditEvent::LoginFailure { .. } => "Login failed",
            AuditEvent::TokenRefresh { .. } => "Token refreshed",
            AuditEvent::RefreshFailure { .. } => "Token refresh failed",
            AuditEvent::RegistrationSuccess { .. } => "User registered",
            AuditEvent::RegistrationFailure { .. } => "Registration failed",
            AuditEvent::UserUpdated { .. } => "User updated",
            AuditEvent::AccessDenied { .. } => "Access denied",
            AuditEvent::InvalidToken { .. } => "Invalid token",
        }
    }

    fn client(&self) -> &ClientInfo {
        match self {
            AuditEvent::LoginSuccess { client, .. }
            | AuditEvent::LoginFailure { client, .. }
            | AuditEvent::TokenRefresh { client, .. }
            | AuditEvent::RefreshFailure { client, .. }
            | AuditEvent::RegistrationSuccess { client, .. }
            | AuditEvent::RegistrationFailure { client, .. }
            | AuditEvent::UserUpdated { client, .. }
            | AuditEvent::AccessDenied { client, .. }
            | AuditEvent::InvalidToken { client, .. } => client,
        }
    }
}

/// Log a security audit event with structured fields
///
/// The full event is serialized to JSON in the `event` field; the client
/// address is repeated as its own field for quick filtering.
pub fn audit_log(event: &AuditEvent) {
    let event_json = serde_json::to_string(event)
        .unwrap_or_else(|e| format!("{{\"error\":\"Failed to serialize audit event: {e}\"}}"));

    info!(
        target: "audit",
        timestamp = %Utc::now(),
        event = %event_json,
        ip_address = ?event.client().ip_address,
        "{}",
        event.summary()
    );
}

/// Extract the client IP address from proxy headers
///
/// Checks X-Forwarded-For (first hop), then X-Real-IP.
pub fn extract_ip_address(headers: &HeaderMap) -> Option<String> {
    if let Some(xff) = headers.get("x-forwarded-for") {
        if let Ok(xff_str) = xff.to_str() {
            if let Some(first_ip) = xff_str.split(',').next() {
                let first_ip = first_ip.trim();
                if !first_ip.is_empty() {
                    return Some(first_ip.to_string());
                }
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            return Some(ip_str.to_string());
        }
    }

    None
}

pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|ua| ua.to_str().ok())
        .map(|s| s.to_string())
}
