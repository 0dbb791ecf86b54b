//! Session service
//!
//! Login, token refresh, registration, profile lookup and account updates.
//! Identities come from a [`UserStore`]; secrets come from the injected
//! [`AuthConfig`]. Emails are compared in their [`normalize_email`] form.

use super::error::AuthError;
use super::jwt::{issue_access_token, issue_refresh_token, validate_refresh_token, Identity};
use super::middleware::AuthContext;
use super::password::{
    hash_password_with_config, validate_password_strength, verify_password, PasswordConfig,
    PasswordError,
};
use crate::audit::{audit_log, AuditEvent, ClientInfo};
use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};
use user_mgmt_core::{
    normalize_email, AuthConfig, CoreError, UserRecord, UserRole, UserStore, UserUpdate,
};
use utoipa::ToSchema;

/// User registration request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub fname: String,
    #[serde(default)]
    pub lname: String,
    pub email: String,
    pub password: String,
}

/// User login request
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Token refresh request
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default, alias = "refresh_token")]
    pub refresh_token: String,
}

/// Partial account update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub fname: Option<String>,
    pub lname: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    /// Only an ADMIN may change a role
    #[schema(value_type = Option<String>, example = "mentor")]
    pub role: Option<UserRole>,
}

/// Authentication response with tokens
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: u64,
    pub user: UserInfo,
}

/// User information response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: String,
    pub fname: String,
    pub lname: String,
    pub email: String,
    #[schema(value_type = String, example = "user")]
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl From<&UserRecord> for UserInfo {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id.clone(),
            fname: user.fname.clone(),
            lname: user.lname.clone(),
            email: user.email.clone(),
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Session service
#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn UserStore>,
    auth: Arc<AuthConfig>,
    password: PasswordConfig,
}

impl SessionService {
    pub fn new(store: Arc<dyn UserStore>, auth: Arc<AuthConfig>) -> Self {
        Self {
            store,
            auth,
            password: PasswordConfig::default(),
        }
    }

    /// Override the Argon2 parameters used for new hashes
    pub fn with_password_config(mut self, password: PasswordConfig) -> Self {
        self.password = password;
        self
    }

    pub fn store(&self) -> &Arc<dyn UserStore> {
        &self.store
    }

    /// Hash a password on the blocking pool
    pub async fn hash_password(&self, password: String) -> Result<String, AuthError> {
        let config = self.password.clone();
        tokio::task::spawn_blocking(move || hash_password_with_config(&password, &config))
            .await
            .map_err(|e| AuthError::Internal(format!("Hashing task failed: {e}")))?
            .map_err(AuthError::from)
    }

    async fn verify_password(&self, password: String, hash: String) -> Result<bool, AuthError> {
        tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AuthError::Internal(format!("Verification task failed: {e}")))?
            .or_else(|e| match e {
                // An unusable stored hash must look like any other bad login
                PasswordError::InvalidHashFormat => {
                    error!("Stored password hash is not a valid PHC string");
                    Ok(false)
                }
                other => Err(AuthError::from(other)),
            })
    }

    fn issue_pair(&self, user: &UserRecord) -> Result<AuthResponse, AuthError> {
        let access_token = issue_access_token(&self.auth, &Identity::from(user))?;
        let refresh_token = issue_refresh_token(&self.auth, &user.id, &user.email)?;

        Ok(AuthResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.auth.access_ttl_secs,
            user: UserInfo::from(user),
        })
    }

    /// Login with email and password
    ///
    /// An unknown email and a wrong password produce the same error, and
    /// both paths pay for one Argon2 computation.
    pub async fn login(
        &self,
        request: LoginRequest,
        client: &ClientInfo,
    ) -> Result<AuthResponse, AppError> {
        if request.email.trim().is_empty() || request.password.is_empty() {
            return Err(AppError::BadRequest(
                "Email and password are required".to_string(),
            ));
        }

        let email = normalize_email(&request.email);
        let Some(user) = self.store.find_by_email(&email).await? else {
            // Burn the same work as a real verification
            self.hash_password(request.password).await?;
            self.login_failed(&email, "unknown email", client);
            return Err(AuthError::InvalidCredentials.into());
        };

        if !self
            .verify_password(request.password, user.password_hash.clone())
            .await?
        {
            self.login_failed(&email, "password mismatch", client);
            return Err(AuthError::InvalidCredentials.into());
        }

        let response = self.issue_pair(&user)?;

        audit_log(&AuditEvent::LoginSuccess {
            user_id: user.id.clone(),
            email: user.email.clone(),
            client: client.clone(),
        });

        Ok(response)
    }

    fn login_failed(&self, email: &str, reason: &str, client: &ClientInfo) {
        audit_log(&AuditEvent::LoginFailure {
            email: email.to_string(),
            reason: reason.to_string(),
            client: client.clone(),
        });
    }

    /// Exchange a refresh token for a new token pair
    ///
    /// The subject is looked up again so the new access token carries the
    /// user's current role. Every token or lookup failure is the same
    /// `InvalidRefreshToken`; only a missing secret or a store outage
    /// surface as server errors.
    pub async fn refresh(
        &self,
        request: RefreshRequest,
        client: &ClientInfo,
    ) -> Result<AuthResponse, AppError> {
        if request.refresh_token.trim().is_empty() {
            return Err(AppError::BadRequest("Refresh token is required".to_string()));
        }

        let claims = match validate_refresh_token(&self.auth, request.refresh_token.trim()) {
            Ok(claims) => claims,
            Err(e) if e.is_configuration() => return Err(AuthError::from(e).into()),
            Err(e) => {
                self.refresh_failed(&e.to_string(), client);
                return Err(AuthError::InvalidRefreshToken.into());
            }
        };

        let Some(user) = self.store.find_by_id(&claims.sub).await? else {
            self.refresh_failed("subject no longer exists", client);
            return Err(AuthError::InvalidRefreshToken.into());
        };

        let response = self.issue_pair(&user)?;

        audit_log(&AuditEvent::TokenRefresh {
            user_id: user.id.clone(),
            email: user.email.clone(),
            client: client.clone(),
        });

        Ok(response)
    }

    fn refresh_failed(&self, reason: &str, client: &ClientInfo) {
        debug!(reason, "Refresh token rejected");
        audit_log(&AuditEvent::RefreshFailure {
            reason: reason.to_string(),
            client: client.clone(),
        });
    }

    /// Register a new user
    ///
    /// Self-registered accounts always get the USER role.
    pub async fn register(
        &self,
        request: RegisterRequest,
        client: &ClientInfo,
    ) -> Result<UserInfo, AppError> {
        let email = normalize_email(&request.email);
        if let Err(reason) = validate_registration(&request) {
            self.registration_failed(&email, &reason, client);
            return Err(AppError::BadRequest(reason));
        }

        let password_hash = self.hash_password(request.password).await?;
        let user = UserRecord::new(
            request.fname.trim(),
            request.lname.trim(),
            email.as_str(),
            password_hash,
            UserRole::User,
        );

        let user = match self.store.create_user(user).await {
            Ok(user) => user,
            Err(e @ CoreError::Conflict(_)) => {
                self.registration_failed(&email, &e.to_string(), client);
                return Err(e.into());
            }
            Err(e) => return Err(e.into()),
        };

        audit_log(&AuditEvent::RegistrationSuccess {
            user_id: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            client: client.clone(),
        });

        Ok(UserInfo::from(&user))
    }

    fn registration_failed(&self, email: &str, reason: &str, client: &ClientInfo) {
        audit_log(&AuditEvent::RegistrationFailure {
            email: email.to_string(),
            reason: reason.to_string(),
            client: client.clone(),
        });
    }

    /// Get user info by id
    pub async fn get_user(&self, user_id: &str) -> Result<UserInfo, AppError> {
        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        Ok(UserInfo::from(&user))
    }

    /// Update an account on behalf of `actor`
    ///
    /// Ownership of `user_id` is checked by the caller. On top of that, only
    /// an ADMIN may change a role; a non-admin sending their current role is
    /// a no-op, any other role is `Forbidden`.
    pub async fn update_user(
        &self,
        user_id: &str,
        request: UpdateUserRequest,
        actor: &AuthContext,
        client: &ClientInfo,
    ) -> Result<UserInfo, AppError> {
        let current = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        let role = request.role.filter(|role| *role != current.role);
        if let Some(role) = role {
            if !actor.is_admin() {
                audit_log(&AuditEvent::AccessDenied {
                    user_id: Some(actor.user_id.clone()),
                    role: Some(actor.role),
                    resource: format!("/api/v1/users/{user_id}"),
                    required_role: Some(UserRole::Admin.as_str().to_string()),
                    client: client.clone(),
                });
                debug!(requested = %role, "Role change by non-admin rejected");
                return Err(AuthError::Forbidden.into());
            }
        }

        let update = self.build_update(request, role).await?;
        if update.is_empty() {
            return Ok(UserInfo::from(&current));
        }
        let fields = changed_fields(&update);

        let user = self
            .store
            .update_user(user_id, update)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        audit_log(&AuditEvent::UserUpdated {
            user_id: user.id.clone(),
            updated_by: actor.user_id.clone(),
            fields,
            new_role: role,
            client: client.clone(),
        });

        Ok(UserInfo::from(&user))
    }

    async fn build_update(
        &self,
        request: UpdateUserRequest,
        role: Option<UserRole>,
    ) -> Result<UserUpdate, AppError> {
        let fname = match request.fname {
            Some(fname) if fname.trim().is_empty() => {
                return Err(AppError::BadRequest("First name is required".to_string()))
            }
            other => other.map(|f| f.trim().to_string()),
        };

        let email = match request.email {
            Some(email) => {
                let email = normalize_email(&email);
                validate_email(&email).map_err(AppError::BadRequest)?;
                Some(email)
            }
            None => None,
        };

        let password_hash = match request.password {
            Some(password) => {
                validate_password_strength(&password)
                    .map_err(|e| AppError::BadRequest(format!("Password validation failed: {e}")))?;
                Some(self.hash_password(password).await?)
            }
            None => None,
        };

        Ok(UserUpdate {
            fname,
            lname: request.lname.map(|l| l.trim().to_string()),
            email,
            password_hash,
            role,
        })
    }
}

/// Names of the fields an update touches; never their values
fn changed_fields(update: &UserUpdate) -> Vec<String> {
    [
        ("fname", update.fname.is_some()),
        ("lname", update.lname.is_some()),
        ("email", update.email.is_some()),
        ("password", update.password_hash.is_some()),
        ("role", update.role.is_some()),
    ]
    .into_iter()
    .filter(|(_, changed)| *changed)
    .map(|(name, _)| name.to_string())
    .collect()
}

fn validate_email(email: &str) -> Result<(), String> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err("Invalid email format".to_string()),
    }
}

fn validate_registration(request: &RegisterRequest) -> Result<(), String> {
    if request.fname.trim().is_empty() {
        return Err("First name is required".to_string());
    }

    validate_email(&normalize_email(&request.email))?;

    validate_password_strength(&request.password)
        .map_err(|e| format!("Password validation failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{validate_access_token, RefreshClaims, TokenClaims};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use user_mgmt_core::InMemoryUserStore;

    const ACCESS_SECRET: &str = "access-secret-for-tests";
    const REFRESH_SECRET: &str = "refresh-secret-for-tests";

    fn auth() -> Arc<AuthConfig> {
        Arc::new(AuthConfig::with_secrets(ACCESS_SECRET, REFRESH_SECRET))
    }

    async fn service_with(auth: Arc<AuthConfig>) -> SessionService {
        let store = Arc::new(InMemoryUserStore::new());
        let service = SessionService::new(store.clone(), auth)
            .with_password_config(PasswordConfig::for_testing());

        let hash = service.hash_password("correct-pw".to_string()).await.unwrap();
        store
            .create_user(
                UserRecord::new("Alice", "Smith", "alice@example.com", hash, UserRole::User)
                    .with_id("alice-id"),
            )
            .await
            .unwrap();

        service
    }

    async fn service() -> SessionService {
        service_with(auth()).await
    }

    fn login_request(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    fn client() -> ClientInfo {
        ClientInfo::default()
    }

    #[tokio::test]
    async fn test_login_returns_tokens_for_stored_identity() {
        let service = service().await;

        let response = service
            .login(login_request("alice@example.com", "correct-pw"), &client())
            .await
            .unwrap();

        let claims = validate_access_token(&auth(), &response.access_token).unwrap();
        assert_eq!(claims.sub, "alice-id");
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.role, UserRole::User);
        assert_eq!(response.token_type, "Bearer");
        assert_eq!(response.expires_in, 3600);
        assert_eq!(response.user.id, "alice-id");
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email_fail_identically() {
        let service = service().await;

        let wrong_password = service
            .login(login_request("alice@example.com", "wrong-pw"), &client())
            .await
            .unwrap_err();
        let unknown_email = service
            .login(login_request("nobody@example.com", "correct-pw"), &client())
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, AppError::Auth(AuthError::InvalidCredentials)));
        assert!(matches!(unknown_email, AppError::Auth(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_requires_email_and_password() {
        let service = service().await;

        let result = service.login(login_request("", "pw"), &client()).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));

        let result = service
            .login(login_request("alice@example.com", ""), &client())
            .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_login_without_secret_is_misconfigured() {
        let service = service_with(Arc::new(AuthConfig::default())).await;

        let result = service
            .login(login_request("alice@example.com", "correct-pw"), &client())
            .await;
        assert!(matches!(
            result,
            Err(AppError::Auth(AuthError::ServiceMisconfigured))
        ));
    }

    #[tokio::test]
    async fn test_refresh_rotates_pair() {
        let service = service().await;
        let login = service
            .login(login_request("alice@example.com", "correct-pw"), &client())
            .await
            .unwrap();

        let refreshed = service
            .refresh(
                RefreshRequest {
                    refresh_token: login.refresh_token.clone(),
                },
                &client(),
            )
            .await
            .unwrap();

        let claims = validate_access_token(&auth(), &refreshed.access_token).unwrap();
        assert_eq!(claims.sub, "alice-id");
        assert_eq!(claims.email, "alice@example.com");
        assert_ne!(refreshed.refresh_token, login.refresh_token);
    }

    #[tokio::test]
    async fn test_refresh_failures_collapse_to_one_error() {
        let service = service().await;
        let now = chrono::Utc::now().timestamp() as u64;

        let expired = encode(
            &Header::default(),
            &TokenClaims::Refresh(RefreshClaims {
                iss: "user-mgmt-api".to_string(),
                sub: "alice-id".to_string(),
                jti: "j1".to_string(),
                iat: now - 7200,
                exp: now - 3600,
                email: "alice@example.com".to_string(),
            }),
            &EncodingKey::from_secret(REFRESH_SECRET.as_bytes()),
        )
        .unwrap();

        let login = service
            .login(login_request("alice@example.com", "correct-pw"), &client())
            .await
            .unwrap();
        let mut tampered = login.refresh_token.clone();
        tampered.push('x');

        let ghost = issue_refresh_token(&auth(), "ghost-id", "ghost@example.com").unwrap();

        for token in [expired, tampered, login.access_token, ghost] {
            let result = service
                .refresh(RefreshRequest { refresh_token: token }, &client())
                .await;
            assert!(
                matches!(result, Err(AppError::Auth(AuthError::InvalidRefreshToken))),
                "expected InvalidRefreshToken"
            );
        }
    }

    #[tokio::test]
    async fn test_refresh_requires_token() {
        let service = service().await;
        let result = service.refresh(RefreshRequest::default(), &client()).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_refresh_picks_up_current_role() {
        let store = Arc::new(InMemoryUserStore::new());
        let service = SessionService::new(store.clone(), auth())
            .with_password_config(PasswordConfig::for_testing());

        // Token issued while the stored user is a mentor
        let refresh = issue_refresh_token(&auth(), "m1", "m@example.com").unwrap();
        store
            .create_user(UserRecord::new("M", "One", "m@example.com", "h", UserRole::Mentor).with_id("m1"))
            .await
            .unwrap();

        let response = service
            .refresh(RefreshRequest { refresh_token: refresh }, &client())
            .await
            .unwrap();
        let claims = validate_access_token(&auth(), &response.access_token).unwrap();
        assert_eq!(claims.role, UserRole::Mentor);
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let service = service().await;

        let user = service
            .register(
                RegisterRequest {
                    fname: "Bob".to_string(),
                    lname: "Jones".to_string(),
                    email: "bob@example.com".to_string(),
                    password: "Str0ng!Pass".to_string(),
                },
                &client(),
            )
            .await
            .unwrap();
        assert_eq!(user.role, UserRole::User);

        let login = service
            .login(login_request("bob@example.com", "Str0ng!Pass"), &client())
            .await
            .unwrap();
        assert_eq!(login.user.id, user.id);
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_and_weak() {
        let service = service().await;

        let duplicate = service
            .register(
                RegisterRequest {
                    fname: "Alice".to_string(),
                    lname: String::new(),
                    email: "alice@example.com".to_string(),
                    password: "Str0ng!Pass".to_string(),
                },
                &client(),
            )
            .await;
        assert!(matches!(duplicate, Err(AppError::Conflict(_))));

        let weak = service
            .register(
                RegisterRequest {
                    fname: "Carl".to_string(),
                    lname: String::new(),
                    email: "carl@example.com".to_string(),
                    password: "weak".to_string(),
                },
                &client(),
            )
            .await;
        assert!(matches!(weak, Err(AppError::BadRequest(_))));

        let bad_email = service
            .register(
                RegisterRequest {
                    fname: "Dee".to_string(),
                    lname: String::new(),
                    email: "not-an-email".to_string(),
                    password: "Str0ng!Pass".to_string(),
                },
                &client(),
            )
            .await;
        assert!(matches!(bad_email, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_get_user() {
        let service = service().await;
        assert_eq!(service.get_user("alice-id").await.unwrap().fname, "Alice");
        assert!(matches!(
            service.get_user("missing").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_login_normalizes_email() {
        let service = service().await;

        let response = service
            .login(login_request("  Alice@Example.com ", "correct-pw"), &client())
            .await
            .unwrap();
        assert_eq!(response.user.id, "alice-id");
    }

    #[tokio::test]
    async fn test_register_normalizes_email_before_uniqueness() {
        let service = service().await;

        let result = service
            .register(
                RegisterRequest {
                    fname: "Alicia".to_string(),
                    lname: String::new(),
                    email: " ALICE@example.com".to_string(),
                    password: "Str0ng!Pass".to_string(),
                },
                &client(),
            )
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));

        let user = service
            .register(
                RegisterRequest {
                    fname: "Eve".to_string(),
                    lname: String::new(),
                    email: "Eve@Example.com".to_string(),
                    password: "Str0ng!Pass".to_string(),
                },
                &client(),
            )
            .await
            .unwrap();
        assert_eq!(user.email, "eve@example.com");
    }

    fn actor(id: &str, role: UserRole) -> AuthContext {
        AuthContext {
            user_id: id.to_string(),
            name: "Actor".to_string(),
            email: format!("{id}@example.com"),
            role,
            jti: "jti".to_string(),
        }
    }

    #[tokio::test]
    async fn test_user_cannot_escalate_own_role() {
        let service = service().await;
        let alice = actor("alice-id", UserRole::User);

        let result = service
            .update_user(
                "alice-id",
                UpdateUserRequest {
                    role: Some(UserRole::Admin),
                    ..Default::default()
                },
                &alice,
                &client(),
            )
            .await;
        assert!(matches!(result, Err(AppError::Auth(AuthError::Forbidden))));
        assert_eq!(service.get_user("alice-id").await.unwrap().role, UserRole::User);

        // Restating the current role is harmless
        let same = service
            .update_user(
                "alice-id",
                UpdateUserRequest {
                    fname: Some("Alicia".to_string()),
                    role: Some(UserRole::User),
                    ..Default::default()
                },
                &alice,
                &client(),
            )
            .await
            .unwrap();
        assert_eq!(same.fname, "Alicia");
        assert_eq!(same.role, UserRole::User);
    }

    #[tokio::test]
    async fn test_admin_can_change_role() {
        let service = service().await;

        let updated = service
            .update_user(
                "alice-id",
                UpdateUserRequest {
                    role: Some(UserRole::Mentor),
                    ..Default::default()
                },
                &actor("admin-id", UserRole::Admin),
                &client(),
            )
            .await
            .unwrap();
        assert_eq!(updated.role, UserRole::Mentor);
    }

    #[tokio::test]
    async fn test_update_password_and_email() {
        let service = service().await;
        let alice = actor("alice-id", UserRole::User);

        let weak = service
            .update_user(
                "alice-id",
                UpdateUserRequest {
                    password: Some("weak".to_string()),
                    ..Default::default()
                },
                &alice,
                &client(),
            )
            .await;
        assert!(matches!(weak, Err(AppError::BadRequest(_))));

        service
            .update_user(
                "alice-id",
                UpdateUserRequest {
                    email: Some(" Alice.New@Example.com".to_string()),
                    password: Some("N3w!Password".to_string()),
                    ..Default::default()
                },
                &alice,
                &client(),
            )
            .await
            .unwrap();

        let old = service
            .login(login_request("alice@example.com", "correct-pw"), &client())
            .await;
        assert!(matches!(old, Err(AppError::Auth(AuthError::InvalidCredentials))));

        let new = service
            .login(login_request("alice.new@example.com", "N3w!Password"), &client())
            .await
            .unwrap();
        assert_eq!(new.user.id, "alice-id");
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let service = service().await;
        let result = service
            .update_user(
                "ghost",
                UpdateUserRequest::default(),
                &actor("admin-id", UserRole::Admin),
                &client(),
            )
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_changed_fields_never_carry_values() {
        let fields = changed_fields(&UserUpdate {
            password_hash: Some("$argon2id$secret".to_string()),
            role: Some(UserRole::Mentor),
            ..Default::default()
        });
        assert_eq!(fields, vec!["password".to_string(), "role".to_string()]);
    }

    #[test]
    fn test_refresh_request_accepts_both_spellings() {
        let camel: RefreshRequest = serde_json::from_str(r#"{"refreshToken":"t"}"#).unwrap();
        let snake: RefreshRequest = serde_json::from_str(r#"{"refresh_token":"t"}"#).unwrap();
        assert_eq!(camel.refresh_token, "t");
        assert_eq!(snake.refresh_token, "t");
    }
}
