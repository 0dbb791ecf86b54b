//! JWT token issuance and validation
//!
//! Access and refresh tokens are HMAC-SHA256 JWTs signed with two distinct
//! secrets. Each token carries a `typ` claim, so the decoded payload is a
//! [`TokenClaims`] sum type and a refresh token can never pass as an access
//! token (or the reverse), even if both secrets were misconfigured to match.

use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use user_mgmt_core::config::configured_secret;
use user_mgmt_core::{AuthConfig, UserRecord, UserRole};
use uuid::Uuid;

/// Identity embedded in an access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

impl From<&UserRecord> for Identity {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id.clone(),
            name: user.fname.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Access token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Token issuer
    pub iss: String,
    /// Subject - user ID
    pub sub: String,
    /// JWT ID - unique per issued token
    pub jti: String,
    /// Issued at timestamp (Unix epoch)
    pub iat: u64,
    /// Expiration timestamp (Unix epoch)
    pub exp: u64,
    /// User's display name
    pub name: String,
    /// User's email address
    pub email: String,
    /// User's role at issuance time
    pub role: UserRole,
}

/// Refresh token claims. Deliberately minimal: no role, no name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub iss: String,
    pub sub: String,
    pub jti: String,
    pub iat: u64,
    pub exp: u64,
    pub email: String,
}

/// Decoded, verified token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "typ", rename_all = "lowercase")]
pub enum TokenClaims {
    Access(AccessClaims),
    Refresh(RefreshClaims),
}

impl TokenClaims {
    /// Expiration timestamp (Unix epoch)
    pub fn exp(&self) -> u64 {
        match self {
            TokenClaims::Access(claims) => claims.exp,
            TokenClaims::Refresh(claims) => claims.exp,
        }
    }
}

/// Token issuance and validation errors
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("{0} signing secret is not configured")]
    MissingSecret(&'static str),

    #[error("Failed to encode JWT: {0}")]
    EncodingError(#[source] jsonwebtoken::errors::Error),

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Malformed token")]
    MalformedToken,

    #[error("Token lifetime of {0}s cannot be represented")]
    InvalidLifetime(u64),

    #[error("System time error: {0}")]
    SystemTimeError(#[from] std::time::SystemTimeError),
}

impl TokenError {
    /// True when the failure is a server-side misconfiguration
    pub fn is_configuration(&self) -> bool {
        matches!(self, TokenError::MissingSecret(_) | TokenError::InvalidLifetime(_))
    }
}

fn secret<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str, TokenError> {
    configured_secret(value.as_deref()).ok_or(TokenError::MissingSecret(name))
}

/// The access-token secret, or `MissingSecret` if it is not configured
pub fn access_secret(config: &AuthConfig) -> Result<&str, TokenError> {
    secret(&config.access_secret, "Access token")
}

/// The refresh-token secret, or `MissingSecret` if it is not configured
pub fn refresh_secret(config: &AuthConfig) -> Result<&str, TokenError> {
    secret(&config.refresh_secret, "Refresh token")
}

fn now_secs() -> Result<u64, TokenError> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

fn expires_at(now: u64, ttl_secs: u64) -> Result<u64, TokenError> {
    now.checked_add(ttl_secs)
        .ok_or(TokenError::InvalidLifetime(ttl_secs))
}

fn sign(claims: &TokenClaims, secret: &str) -> Result<String, TokenError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(TokenError::EncodingError)
}

/// Issue a signed access token for an identity
///
/// The secret is checked before anything is signed; a missing secret is a
/// `MissingSecret` error, never an unsigned or default-signed token.
pub fn issue_access_token(config: &AuthConfig, identity: &Identity) -> Result<String, TokenError> {
    let secret = access_secret(config)?;
    let now = now_secs()?;

    let claims = TokenClaims::Access(AccessClaims {
        iss: config.issuer.clone(),
        sub: identity.id.clone(),
        jti: Uuid::new_v4().to_string(),
        iat: now,
        exp: expires_at(now, config.access_ttl_secs)?,
        name: identity.name.clone(),
        email: identity.email.clone(),
        role: identity.role,
    });

    sign(&claims, secret)
}

/// Issue a signed refresh token for a subject
pub fn issue_refresh_token(config: &AuthConfig, subject_id: &str, email: &str) -> Result<String, TokenError> {
    let secret = refresh_secret(config)?;
    let now = now_secs()?;

    let claims = TokenClaims::Refresh(RefreshClaims {
        iss: config.issuer.clone(),
        sub: subject_id.to_string(),
        jti: Uuid::new_v4().to_string(),
        iat: now,
        exp: expires_at(now, config.refresh_ttl_secs)?,
        email: email.to_string(),
    });

    sign(&claims, secret)
}

/// Verify signature, issuer and expiry of a token and decode its claims
///
/// No clock leeway: a token is valid only strictly before its `exp`.
/// jsonwebtoken alone still accepts the second where `exp == now`, so that
/// boundary is checked here.
pub fn decode_token(token: &str, secret: &str, issuer: &str) -> Result<TokenClaims, TokenError> {
    let claims = decode_claims(token, secret, issuer)?;
    if claims.exp() <= now_secs()? {
        return Err(TokenError::ExpiredToken);
    }
    Ok(claims)
}

fn decode_claims(token: &str, secret: &str, issuer: &str) -> Result<TokenClaims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[issuer]);
    validation.set_required_spec_claims(&["exp", "iss", "sub"]);
    validation.leeway = 0;

    let token_data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => TokenError::ExpiredToken,
        _ => TokenError::MalformedToken,
    })?;

    Ok(token_data.claims)
}

/// Validate an access token and extract its claims
pub fn validate_access_token(config: &AuthConfig, token: &str) -> Result<AccessClaims, TokenError> {
    let secret = access_secret(config)?;
    match decode_token(token, secret, &config.issuer)? {
        TokenClaims::Access(claims) => Ok(claims),
        TokenClaims::Refresh(_) => Err(TokenError::MalformedToken),
    }
}

/// Validate a refresh token and extract its claims
pub fn validate_refresh_token(config: &AuthConfig, token: &str) -> Result<RefreshClaims, TokenError> {
    let secret = refresh_secret(config)?;
    match decode_token(token, secret, &config.issuer)? {
        TokenClaims::Refresh(claims) => Ok(claims),
        TokenClaims::Access(_) => Err(TokenError::MalformedToken),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuthConfig {
        AuthConfig::with_secrets("access-secret-for-tests", "refresh-secret-for-tests")
    }

    fn alice() -> Identity {
        Identity {
            id: "alice-id".to_string(),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            role: UserRole::User,
        }
    }

    fn now() -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs()
    }

    #[test]
    fn test_issue_and_validate_access_token() {
        let config = config();
        let token = issue_access_token(&config, &alice()).expect("Failed to issue token");

        let claims = validate_access_token(&config, &token).expect("Failed to validate token");

        assert_eq!(claims.sub, "alice-id");
        assert_eq!(claims.name, "Alice");
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.role, UserRole::User);
        assert_eq!(claims.iss, "user-mgmt-api");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_issue_and_validate_refresh_token() {
        let config = config();
        let token = issue_refresh_token(&config, "alice-id", "alice@example.com").unwrap();

        let claims = validate_refresh_token(&config, &token).unwrap();
        assert_eq!(claims.sub, "alice-id");
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 3600);
    }

    #[test]
    fn test_token_kinds_are_not_interchangeable() {
        let config = AuthConfig::with_secrets("same-secret", "same-secret");

        let access = issue_access_token(&config, &alice()).unwrap();
        let refresh = issue_refresh_token(&config, "alice-id", "alice@example.com").unwrap();

        assert!(matches!(
            validate_refresh_token(&config, &access),
            Err(TokenError::MalformedToken)
        ));
        assert!(matches!(
            validate_access_token(&config, &refresh),
            Err(TokenError::MalformedToken)
        ));
    }

    #[test]
    fn test_refresh_token_rejected_by_access_secret() {
        let config = config();
        let refresh = issue_refresh_token(&config, "alice-id", "alice@example.com").unwrap();

        let result = decode_token(&refresh, "access-secret-for-tests", &config.issuer);
        assert!(matches!(result, Err(TokenError::MalformedToken)));
    }

    #[test]
    fn test_invalid_token() {
        let result = validate_access_token(&config(), "invalid.token.here");
        assert!(matches!(result, Err(TokenError::MalformedToken)));
    }

    #[test]
    fn test_wrong_secret() {
        let token = issue_access_token(&config(), &alice()).unwrap();

        let other = AuthConfig::with_secrets("some-other-secret", "refresh-secret-for-tests");
        let result = validate_access_token(&other, &token);
        assert!(matches!(result, Err(TokenError::MalformedToken)));
    }

    #[test]
    fn test_wrong_issuer() {
        let token = issue_access_token(&config(), &alice()).unwrap();

        let other = AuthConfig {
            issuer: "someone-else".to_string(),
            ..config()
        };
        assert!(validate_access_token(&other, &token).is_err());
    }

    #[test]
    fn test_expired_token() {
        let config = config();
        let now = now();

        // Correct signature, expired an hour ago
        let claims = TokenClaims::Access(AccessClaims {
            iss: config.issuer.clone(),
            sub: "alice-id".to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now - 7200,
            exp: now - 3600,
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            role: UserRole::User,
        });
        let token = sign(&claims, "access-secret-for-tests").unwrap();

        let result = validate_access_token(&config, &token);
        assert!(matches!(result, Err(TokenError::ExpiredToken)));
    }

    #[test]
    fn test_expired_token_with_wrong_signature_still_fails() {
        let config = config();
        let now = now();

        let claims = TokenClaims::Refresh(RefreshClaims {
            iss: config.issuer.clone(),
            sub: "alice-id".to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now - 7200,
            exp: now - 3600,
            email: "alice@example.com".to_string(),
        });
        let token = sign(&claims, "forged-secret").unwrap();

        assert!(validate_refresh_token(&config, &token).is_err());
    }

    #[test]
    fn test_token_expiring_this_second_is_rejected() {
        let config = config();
        let now = now();

        let claims = TokenClaims::Access(AccessClaims {
            iss: config.issuer.clone(),
            sub: "alice-id".to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now - 60,
            exp: now,
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            role: UserRole::User,
        });
        let token = sign(&claims, "access-secret-for-tests").unwrap();

        let result = validate_access_token(&config, &token);
        assert!(matches!(result, Err(TokenError::ExpiredToken)));
    }

    #[test]
    fn test_overflowing_lifetime_is_an_error() {
        let config = AuthConfig {
            access_ttl_secs: u64::MAX,
            refresh_ttl_secs: u64::MAX,
            ..config()
        };

        let access = issue_access_token(&config, &alice());
        assert!(matches!(access, Err(TokenError::InvalidLifetime(u64::MAX))));
        assert!(access.unwrap_err().is_configuration());

        let refresh = issue_refresh_token(&config, "alice-id", "alice@example.com");
        assert!(matches!(refresh, Err(TokenError::InvalidLifetime(_))));
    }

    #[test]
    fn test_missing_secret_fails_at_issuance() {
        let config = AuthConfig::default();

        let access = issue_access_token(&config, &alice());
        assert!(matches!(access, Err(TokenError::MissingSecret(_))));
        assert!(access.unwrap_err().is_configuration());

        let refresh = issue_refresh_token(&config, "alice-id", "alice@example.com");
        assert!(matches!(refresh, Err(TokenError::MissingSecret(_))));
    }

    #[test]
    fn test_empty_secret_is_missing() {
        let config = AuthConfig::with_secrets("", "refresh");
        assert!(matches!(
            issue_access_token(&config, &alice()),
            Err(TokenError::MissingSecret(_))
        ));
    }

    #[test]
    fn test_whitespace_secret_is_missing() {
        let config = AuthConfig::with_secrets("access", " \t");
        assert!(matches!(
            issue_refresh_token(&config, "alice-id", "alice@example.com"),
            Err(TokenError::MissingSecret(_))
        ));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_secret_fails_at_validation() {
        let token = issue_access_token(&config(), &alice()).unwrap();
        let result = validate_access_token(&AuthConfig::default(), &token);
        assert!(matches!(result, Err(TokenError::MissingSecret(_))));
    }

    #[test]
    fn test_each_token_gets_unique_jti() {
        let config = config();
        let a = validate_access_token(&config, &issue_access_token(&config, &alice()).unwrap()).unwrap();
        let b = validate_access_token(&config, &issue_access_token(&config, &alice()).unwrap()).unwrap();
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn test_claims_carry_type_tag() {
        let claims = TokenClaims::Refresh(RefreshClaims {
            iss: "i".to_string(),
            sub: "s".to_string(),
            jti: "j".to_string(),
            iat: 1,
            exp: 2,
            email: "e@example.com".to_string(),
        });
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["typ"], "refresh");
        assert!(json.get("role").is_none());
    }
}
