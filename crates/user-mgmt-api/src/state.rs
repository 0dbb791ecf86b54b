//! Application state management
//!
//! Author: hephaex@gmail.com

use crate::auth::{PasswordConfig, SessionService};
use std::sync::Arc;
use std::time::Instant;
use user_mgmt_core::{AppConfig, AuthConfig, UserStore};

/// Application state shared across handlers
///
/// Everything here is immutable after startup.
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Token secrets and lifetimes, shared with the auth gate
    pub auth: Arc<AuthConfig>,
    /// Identity store
    pub store: Arc<dyn UserStore>,
    /// Login, refresh and registration
    pub sessions: SessionService,
    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    /// Create new application state with config and identity store
    pub fn new(config: AppConfig, store: Arc<dyn UserStore>) -> Self {
        let auth = Arc::new(config.auth.clone());
        let sessions = SessionService::new(store.clone(), auth.clone());

        Self {
            config,
            auth,
            store,
            sessions,
            start_time: Instant::now(),
        }
    }

    /// Override the Argon2 parameters (cheap parameters keep tests fast)
    pub fn with_password_config(mut self, password: PasswordConfig) -> Self {
        self.sessions = self.sessions.with_password_config(password);
        self
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Both signing secrets are present
    pub fn auth_configured(&self) -> bool {
        self.auth.validate().is_ok()
    }
}
