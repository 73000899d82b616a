//! Refresh token model.
//!
//! Refresh tokens are opaque random strings handed to the client once. Only
//! their SHA-256 hash is stored, the same way API keys are looked up by hash.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Represents a refresh token record from the database.
///
/// # Database Table
///
/// Maps to the `refresh_tokens` table. A token is usable while
/// `revoked_at IS NULL AND expires_at > NOW()`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,

    /// SHA-256 hash of the token (64 hex characters)
    pub token_hash: String,

    pub expires_at: DateTime<Utc>,

    /// Set on rotation, logout or account deactivation
    pub revoked_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

impl RefreshToken {
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn token(expires_in: Duration, revoked: bool) -> RefreshToken {
        let now = Utc::now();
        RefreshToken {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            token_hash: "00".repeat(32),
            expires_at: now + expires_in,
            revoked_at: revoked.then_some(now),
            created_at: now,
        }
    }

    #[test]
    fn usable_until_expiry_or_revocation() {
        let now = Utc::now();
        assert!(token(Duration::days(1), false).is_usable(now));
        assert!(!token(Duration::days(-1), false).is_usable(now));
        assert!(!token(Duration::days(1), true).is_usable(now));
    }
}
