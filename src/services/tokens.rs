//! Password hashing, access tokens and refresh tokens.
//!
//! - Passwords are stored as Argon2 PHC strings.
//! - Access tokens are short-lived HS256 JWTs carrying the user id and role.
//! - Refresh tokens are 32 random bytes, hex encoded. Only their SHA-256 hash
//!   is persisted, so a leaked table does not leak usable tokens.

use std::sync::LazyLock;

use argon2::{
    Argon2, PasswordHash,
    password_hash::{PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{error::AppError, models::user::Role};

/// Claims embedded in access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: Uuid,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Hash a password with Argon2 and a random salt.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

/// Check a password against a stored PHC string.
///
/// A hash that cannot be parsed (e.g. the `!` marker used for accounts
/// without password login) never verifies.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(password_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Hash of a throwaway password with the same Argon2 parameters as real ones.
static DUMMY_HASH: LazyLock<String> =
    LazyLock::new(|| hash_password("agrored-dummy-password-1").unwrap_or_default());

/// Spend the same work as [`verify_password`] when there is no stored hash.
///
/// Always returns `false`; keeps login timing independent of whether the
/// email exists.
pub fn verify_dummy_password(password: &str) -> bool {
    let _ = verify_password(password, &DUMMY_HASH);
    false
}

/// Issue an access token valid for `ttl`.
pub fn issue_access_token(
    secret: &str,
    user_id: Uuid,
    role: Role,
    ttl: Duration,
) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        role,
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("token encoding failed: {e}")))
}

/// Decode and validate an access token (signature and expiry).
pub fn decode_access_token(secret: &str, token: &str) -> Result<Claims, AppError> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::InvalidToken)
}

/// Generate an opaque refresh token (64 hex characters).
pub fn generate_refresh_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

/// SHA-256 hex digest used to store and look up refresh tokens.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-test-secret-test-secret";

    #[test]
    fn password_roundtrip() {
        let hash = hash_password("Cosecha2024").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("Cosecha2024", &hash));
        assert!(!verify_password("cosecha2024", &hash));
    }

    #[test]
    fn dummy_verification_runs_argon2_and_fails() {
        assert!(DUMMY_HASH.starts_with("$argon2"));
        assert!(!verify_dummy_password("agrored-dummy-password-1"));
        assert!(!verify_dummy_password("Cosecha2024"));
    }

    #[test]
    fn disabled_password_marker_never_verifies() {
        assert!(!verify_password("anything", "!"));
        assert!(!verify_password("", ""));
    }

    #[test]
    fn access_token_carries_user_and_role() {
        let user_id = Uuid::new_v4();
        let token =
            issue_access_token(SECRET, user_id, Role::Contractor, Duration::minutes(15)).unwrap();
        let claims = decode_access_token(SECRET, &token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, Role::Contractor);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn expired_or_foreign_tokens_are_rejected() {
        let user_id = Uuid::new_v4();
        let expired =
            issue_access_token(SECRET, user_id, Role::User, Duration::minutes(-10)).unwrap();
        assert!(matches!(
            decode_access_token(SECRET, &expired),
            Err(AppError::InvalidToken)
        ));

        let token = issue_access_token(SECRET, user_id, Role::User, Duration::minutes(5)).unwrap();
        assert!(matches!(
            decode_access_token("another-secret-another-secret-xx", &token),
            Err(AppError::InvalidToken)
        ));
        assert!(decode_access_token(SECRET, "not-a-jwt").is_err());
    }

    #[test]
    fn refresh_tokens_are_random_and_hashed() {
        let a = generate_refresh_token();
        let b = generate_refresh_token();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);

        let hash = hash_token(&a);
        assert_eq!(hash.len(), 64);
        assert_ne!(hash, a);
        assert_eq!(hash, hash_token(&a));
    }
}
