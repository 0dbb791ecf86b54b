//! Fixtures for integration tests
//!
//! Enabled with the `test-utils` feature.

use crate::auth::PasswordConfig;
use crate::state::AppState;
use axum::Router;
use std::sync::Arc;
use user_mgmt_core::{
    AddressRecord, AppConfig, AuthConfig, InMemoryUserStore, UserRecord, UserRole, UserStore,
};

pub const ACCESS_SECRET: &str = "test-access-secret";
pub const REFRESH_SECRET: &str = "test-refresh-secret";

/// Password shared by every fixture user
pub const FIXTURE_PASSWORD: &str = "correct-pw";

/// Auth config with both test secrets and default lifetimes
pub fn test_auth_config() -> AuthConfig {
    AuthConfig::with_secrets(ACCESS_SECRET, REFRESH_SECRET)
}

/// State over an empty in-memory store with cheap Argon2 parameters
pub fn test_state(auth: AuthConfig) -> (Arc<AppState>, Arc<InMemoryUserStore>) {
    let store = Arc::new(InMemoryUserStore::new());
    let config = AppConfig {
        auth,
        ..AppConfig::default()
    };
    let state = AppState::new(config, store.clone()).with_password_config(PasswordConfig::for_testing());

    (Arc::new(state), store)
}

/// Seed the fixture identities
///
/// | id         | email               | role   |
/// |------------|---------------------|--------|
/// | alice-id   | alice@example.com   | user   |
/// | admin-id   | admin@example.com   | admin  |
/// | mentor-id  | mentor@example.com  | mentor |
/// | u1         | u1@example.com      | user   |
/// | u2         | u2@example.com      | user   |
///
/// `u1` owns address `addr-1`.
pub async fn seed_fixtures(state: &AppState, store: &InMemoryUserStore) {
    let hash = state
        .sessions
        .hash_password(FIXTURE_PASSWORD.to_string())
        .await
        .expect("fixture hash");

    let fixtures = [
        ("alice-id", "Alice", "alice@example.com", UserRole::User),
        ("admin-id", "Ada", "admin@example.com", UserRole::Admin),
        ("mentor-id", "Mo", "mentor@example.com", UserRole::Mentor),
        ("u1", "Uno", "u1@example.com", UserRole::User),
        ("u2", "Dos", "u2@example.com", UserRole::User),
    ];

    for (id, fname, email, role) in fixtures {
        store
            .create_user(UserRecord::new(fname, "Test", email, hash.clone(), role).with_id(id))
            .await
            .expect("fixture user");
    }

    store
        .add_address(AddressRecord {
            id: "addr-1".to_string(),
            user_id: "u1".to_string(),
            street: "1 Main St".to_string(),
            city: "Lagos".to_string(),
            country: "NG".to_string(),
        })
        .await
        .expect("fixture address");
}

/// Router over seeded fixtures with the test secrets
pub async fn create_router_for_testing() -> Router {
    let (state, store) = test_state(test_auth_config());
    seed_fixtures(&state, &store).await;
    crate::create_router(state)
}
