//! User Management Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout the system:
//! - User roles, identity records and the resources users own
//! - The identity store trait consumed by the auth layer
//! - Common error types
//! - Configuration management
//! - Identity storage (in-memory and PostgreSQL)

pub mod config;
pub mod identity;
pub mod postgres;

pub use config::{AppConfig, AuthConfig, ConfigError, DatabaseConfig, LoggingConfig, ServerConfig};
pub use identity::{InMemoryUserStore, UserStore};
pub use postgres::PgUserStore;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for identity store operations
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

// ============================================================================
// Roles
// ============================================================================

/// User role
///
/// Closed set of access levels:
/// - Admin: full access, bypasses role and ownership checks
/// - User: regular account, restricted to its own resources
/// - Mentor: supervises internships; otherwise treated like a user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    #[default]
    User,
    Mentor,
}

impl UserRole {
    /// Convert role to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::User => "user",
            UserRole::Mentor => "mentor",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = CoreError;

    /// Roles are stored upper- or lower-case depending on the writer,
    /// so parsing is case-insensitive.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(UserRole::Admin),
            "user" => Ok(UserRole::User),
            "mentor" => Ok(UserRole::Mentor),
            other => Err(CoreError::ValidationError(format!("Unknown role: {other}"))),
        }
    }
}

// ============================================================================
// Identity Records
// ============================================================================

/// Persisted user account as seen by the auth layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    /// Unique user identifier
    pub id: String,

    /// First name, used as the display name in tokens
    pub fname: String,

    /// Last name
    pub lname: String,

    /// Login email (unique)
    pub email: String,

    /// Password hash in PHC string format. Never serialized.
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    pub role: UserRole,

    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// Create a new user record with a freshly generated id
    pub fn new(
        fname: impl Into<String>,
        lname: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        role: UserRole,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            fname: fname.into(),
            lname: lname.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            role,
            created_at: Utc::now(),
        }
    }

    /// Override the generated id (fixtures and imports)
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Apply a partial update in place
    pub fn apply(&mut self, update: UserUpdate) {
        if let Some(fname) = update.fname {
            self.fname = fname;
        }
        if let Some(lname) = update.lname {
            self.lname = lname;
        }
        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(password_hash) = update.password_hash {
            self.password_hash = password_hash;
        }
        if let Some(role) = update.role {
            self.role = role;
        }
    }
}

/// Canonical form of a login email: trimmed and lowercased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Partial update of a user account. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserUpdate {
    pub fname: Option<String>,
    pub lname: Option<String>,
    /// Already normalized with [`normalize_email`]
    pub email: Option<String>,
    /// Already hashed
    pub password_hash: Option<String>,
    pub role: Option<UserRole>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Internship held by a user, supervised by a named mentor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternshipRecord {
    pub id: String,
    pub user_id: String,
    pub mentor_name: String,
    pub joined_date: NaiveDate,
    pub completion_date: Option<NaiveDate>,
    pub is_certified: bool,
}

impl InternshipRecord {
    /// Create a new internship with a freshly generated id
    pub fn new(user_id: impl Into<String>, mentor_name: impl Into<String>, joined_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            mentor_name: mentor_name.into(),
            joined_date,
            completion_date: None,
            is_certified: false,
        }
    }
}

/// Postal address owned by a user (nested resource)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressRecord {
    pub id: String,
    pub user_id: String,
    pub street: String,
    pub city: String,
    pub country: String,
}
