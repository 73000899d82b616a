//! Bearer token authentication middleware.
//!
//! This middleware intercepts every protected request to:
//! 1. Extract the access token from the Authorization header
//! 2. Verify its signature and expiry
//! 3. Load the user and reject deactivated accounts
//! 4. Inject authentication context into the request
//!
//! The role is re-read from the database on every request, so role changes
//! and deactivations take effect without waiting for tokens to expire.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, request::Parts},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::user::Role,
    services::tokens,
    state::AppState,
};

/// Authentication context attached to authenticated requests.
///
/// This struct is inserted into the request's extension map and can be
/// extracted by route handlers to know who made the request.
#[derive(Debug, Clone, Copy)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub role: Role,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Fail with `Forbidden` unless the caller is ADMIN or SUPERADMIN.
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::forbidden())
        }
    }

    pub fn require_superadmin(&self) -> Result<(), AppError> {
        if self.role == Role::Superadmin {
            Ok(())
        } else {
            Err(AppError::forbidden())
        }
    }

    /// Owner of the resource or an admin.
    pub fn require_owner_or_admin(&self, owner_id: Uuid) -> Result<(), AppError> {
        if self.user_id == owner_id || self.is_admin() {
            Ok(())
        } else {
            Err(AppError::forbidden())
        }
    }
}

/// Pull the token out of `Authorization: Bearer <token>`.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Validate a token and load the caller's current role.
async fn authenticate(state: &AppState, token: &str) -> Result<AuthContext, AppError> {
    let claims = tokens::decode_access_token(&state.config.jwt_secret, token)?;

    let (role, is_active): (Role, bool) =
        sqlx::query_as("SELECT role, is_active FROM users WHERE id = $1")
            .bind(claims.sub)
            .fetch_optional(&state.pool)
            .await?
            .ok_or(AppError::InvalidToken)?;

    if !is_active {
        return Err(AppError::AccountDisabled);
    }

    Ok(AuthContext {
        user_id: claims.sub,
        role,
    })
}

/// Authentication middleware function.
///
/// # Flow
///
/// 1. Extract `Authorization: Bearer <token>` header from request
/// 2. Decode the JWT with the configured secret
/// 3. Look up the user; it must exist and be active
/// 4. If valid: inject `AuthContext` into request, call next handler
/// 5. Otherwise: return 401 (or 403 for deactivated accounts)
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers()).ok_or(AppError::Unauthorized)?;
    let auth_context = authenticate(&state, token).await?;

    // Route handlers can now extract this using Extension<AuthContext>
    request.extensions_mut().insert(auth_context);

    Ok(next.run(request).await)
}

/// Optional authentication for public routes.
///
/// Anonymous requests yield `None`; a present but invalid token is still
/// rejected so clients notice expired sessions.
#[derive(Debug, Clone, Copy)]
pub struct MaybeAuth(pub Option<AuthContext>);

impl FromRequestParts<AppState> for MaybeAuth {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match bearer_token(&parts.headers) {
            Some(token) => Ok(MaybeAuth(Some(authenticate(state, token).await?))),
            None => Ok(MaybeAuth(None)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert("Authorization", HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert("Authorization", HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);

        headers.insert("Authorization", HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn role_guards() {
        let owner = Uuid::new_v4();
        let user = AuthContext {
            user_id: owner,
            role: Role::Contractor,
        };
        assert!(user.require_owner_or_admin(owner).is_ok());
        assert!(user.require_owner_or_admin(Uuid::new_v4()).is_err());
        assert!(user.require_admin().is_err());

        let admin = AuthContext {
            user_id: Uuid::new_v4(),
            role: Role::Admin,
        };
        assert!(admin.require_owner_or_admin(owner).is_ok());
        assert!(admin.require_admin().is_ok());
        assert!(admin.require_superadmin().is_err());
    }
}
