//! Auth service - registration, login and token lifecycle.
//!
//! This service handles:
//! - Registration with full-form validation
//! - Credential checks and account status
//! - Issuing access/refresh token pairs
//! - Refresh token rotation and revocation
//!
//! # Token Rotation
//!
//! Every successful refresh revokes the presented refresh token and issues a
//! new one inside the same database transaction, so a token can be exchanged
//! at most once.

use chrono::{Duration, Utc};
use sqlx::{PgExecutor, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    config::Config,
    db::DbPool,
    error::AppError,
    models::{
        refresh_token::RefreshToken,
        security_log::SecurityEvent,
        setting::REGISTRATION_ENABLED,
        user::{
            AuthResponse, RegisterRequest, Role, USER_COLUMNS, UpdateProfileRequest, User,
            UserResponse,
        },
    },
    services::{
        security_log_service, settings_service,
        tokens::{self, hash_token},
        validation::{self, FieldErrors, MAX_NAME_LEN},
    },
};

/// Register a new account and sign it in.
///
/// # Process
///
/// 1. Refuse when registrations are disabled in settings
/// 2. Validate every wizard field, reporting all failures at once
/// 3. Hash the password and insert the user (duplicate email -> `Conflict`)
/// 4. Log the event and store the refresh token
///
/// Steps 3 and 4 share one transaction, so a failure leaves no account behind.
///
/// # Errors
///
/// - `Validation`: one or more fields are invalid
/// - `Conflict`: email already registered
/// - `Forbidden`: registrations are disabled
pub async fn register(
    pool: &DbPool,
    config: &Config,
    request: RegisterRequest,
    ip: Option<&str>,
) -> Result<AuthResponse, AppError> {
    if !settings_service::get_bool(pool, REGISTRATION_ENABLED, true).await? {
        return Err(AppError::Forbidden(
            "Registrations are currently closed".to_string(),
        ));
    }

    let phone = validation::validate_registration(&request)?;
    let email = validation::normalize_email(&request.email);
    let password_hash = tokens::hash_password(&request.password)?;

    let mut tx = pool.begin().await?;

    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (email, password_hash, first_name, last_name, phone, role)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(&email)
    .bind(password_hash)
    .bind(request.first_name.trim())
    .bind(request.last_name.trim())
    .bind(phone)
    .bind(request.role)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| match AppError::from(e) {
        AppError::Conflict(_) => AppError::Conflict("Email is already registered".to_string()),
        other => other,
    })?;

    security_log_service::record(&mut *tx, SecurityEvent::Register, Some(user.id), ip, None)
        .await?;
    let session = issue_session(&mut tx, config, user).await?;
    tx.commit().await?;

    tracing::info!(user_id = %session.user.id, role = session.user.role.as_str(), "user_registered");
    Ok(session)
}

/// Authenticate with email and password.
///
/// Unknown emails and wrong passwords produce the same error so that
/// responses do not reveal which emails are registered.
pub async fn login(
    pool: &DbPool,
    config: &Config,
    email: &str,
    password: &str,
    ip: Option<&str>,
) -> Result<AuthResponse, AppError> {
    let email = validation::normalize_email(email);

    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
    ))
    .bind(&email)
    .fetch_optional(pool)
    .await?;

    let verified = match &user {
        Some(u) => tokens::verify_password(password, &u.password_hash),
        None => tokens::verify_dummy_password(password),
    };
    let Some(user) = user.filter(|_| verified) else {
        security_log_service::record(
            pool,
            SecurityEvent::LoginFailure,
            None,
            ip,
            Some(serde_json::json!({ "email": email })),
        )
        .await?;
        return Err(AppError::InvalidCredentials);
    };

    if !user.is_active {
        return Err(AppError::AccountDisabled);
    }

    let mut tx = pool.begin().await?;

    let user = sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET last_login_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
    ))
    .bind(user.id)
    .fetch_one(&mut *tx)
    .await?;

    security_log_service::record(&mut *tx, SecurityEvent::LoginSuccess, Some(user.id), ip, None)
        .await?;
    let session = issue_session(&mut tx, config, user).await?;
    tx.commit().await?;

    Ok(session)
}

/// Exchange a refresh token for a new token pair.
///
/// # Errors
///
/// - `InvalidToken`: unknown, expired or already used token
/// - `AccountDisabled`: the user was deactivated since the token was issued
pub async fn refresh(
    pool: &DbPool,
    config: &Config,
    refresh_token: &str,
    ip: Option<&str>,
) -> Result<AuthResponse, AppError> {
    let token_hash = hash_token(refresh_token);

    let mut tx = pool.begin().await?;

    // Lock the token row so two concurrent refreshes cannot both succeed
    let stored = sqlx::query_as::<_, RefreshToken>(
        r#"
        SELECT id, user_id, token_hash, expires_at, revoked_at, created_at
        FROM refresh_tokens
        WHERE token_hash = $1
        FOR UPDATE
        "#,
    )
    .bind(&token_hash)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(stored) = stored.filter(|t| t.is_usable(Utc::now())) else {
        tx.rollback().await?;
        security_log_service::record(pool, SecurityEvent::TokenRefreshFailure, None, ip, None)
            .await?;
        return Err(AppError::InvalidToken);
    };

    sqlx::query("UPDATE refresh_tokens SET revoked_at = NOW() WHERE id = $1")
        .bind(stored.id)
        .execute(&mut *tx)
        .await?;

    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
    ))
    .bind(stored.user_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::InvalidToken)?;

    if !user.is_active {
        tx.rollback().await?;
        return Err(AppError::AccountDisabled);
    }

    let (new_token, expires_in) = store_refresh_token(&mut tx, config, user.id).await?;
    tx.commit().await?;

    let access_token = tokens::issue_access_token(
        &config.jwt_secret,
        user.id,
        user.role,
        Duration::minutes(config.access_token_ttl_minutes),
    )?;

    tracing::debug!(user_id = %user.id, "refresh_token_rotated");

    Ok(AuthResponse {
        user: user.into(),
        access_token,
        refresh_token: new_token,
        token_type: "Bearer",
        expires_in,
    })
}

/// Revoke a refresh token. Unknown or already revoked tokens are ignored.
pub async fn logout(pool: &DbPool, refresh_token: &str, ip: Option<&str>) -> Result<(), AppError> {
    let user_id: Option<Uuid> = sqlx::query_scalar(
        r#"
        UPDATE refresh_tokens SET revoked_at = NOW()
        WHERE token_hash = $1 AND revoked_at IS NULL
        RETURNING user_id
        "#,
    )
    .bind(hash_token(refresh_token))
    .fetch_optional(pool)
    .await?;

    if let Some(user_id) = user_id {
        security_log_service::record(pool, SecurityEvent::Logout, Some(user_id), ip, None).await?;
    }
    Ok(())
}

/// Revoke every live refresh token of a user (used on deactivation).
pub async fn revoke_all_for_user<'e, E>(executor: E, user_id: Uuid) -> Result<u64, AppError>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        "UPDATE refresh_tokens SET revoked_at = NOW() WHERE user_id = $1 AND revoked_at IS NULL",
    )
    .bind(user_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

/// Load a user by id.
pub async fn find_user(pool: &DbPool, user_id: Uuid) -> Result<User, AppError> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("User"))
}

/// Update the caller's own profile.
pub async fn update_profile(
    pool: &DbPool,
    user_id: Uuid,
    request: UpdateProfileRequest,
) -> Result<UserResponse, AppError> {
    let mut errors = FieldErrors::default();
    if let Some(first_name) = &request.first_name {
        errors.require_text("first_name", first_name, MAX_NAME_LEN);
    }
    if let Some(last_name) = &request.last_name {
        errors.require_text("last_name", last_name, MAX_NAME_LEN);
    }
    // An empty phone clears it; anything else must be a valid number
    let phone = match request.phone.as_deref().map(str::trim) {
        Some("") => Some(None),
        Some(raw) => match validation::normalize_phone(raw) {
            Some(normalized) => Some(Some(normalized)),
            None => {
                errors.add("phone", "Invalid phone number");
                None
            }
        },
        None => None,
    };
    errors.into_result()?;

    let current = find_user(pool, user_id).await?;
    if phone == Some(None) && current.role == Role::Contractor {
        let mut errors = FieldErrors::default();
        errors.add("phone", "Contractors must provide a phone number");
        return Err(AppError::Validation(errors));
    }

    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users SET
            first_name = $2,
            last_name = $3,
            phone = $4,
            avatar_url = $5,
            updated_at = NOW()
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(
        request
            .first_name
            .map(|s| s.trim().to_string())
            .unwrap_or(current.first_name),
    )
    .bind(
        request
            .last_name
            .map(|s| s.trim().to_string())
            .unwrap_or(current.last_name),
    )
    .bind(phone.unwrap_or(current.phone))
    .bind(request.avatar_url.or(current.avatar_url))
    .fetch_one(pool)
    .await?;

    Ok(user.into())
}

/// Issue an access token and store a refresh token for `user` in `tx`.
async fn issue_session(
    tx: &mut Transaction<'_, Postgres>,
    config: &Config,
    user: User,
) -> Result<AuthResponse, AppError> {
    let access_token = tokens::issue_access_token(
        &config.jwt_secret,
        user.id,
        user.role,
        Duration::minutes(config.access_token_ttl_minutes),
    )?;

    let (refresh_token, expires_in) = store_refresh_token(tx, config, user.id).await?;

    Ok(AuthResponse {
        user: user.into(),
        access_token,
        refresh_token,
        token_type: "Bearer",
        expires_in,
    })
}

/// Insert a fresh refresh token, returning it with the access token lifetime in seconds.
async fn store_refresh_token(
    tx: &mut Transaction<'_, Postgres>,
    config: &Config,
    user_id: Uuid,
) -> Result<(String, i64), AppError> {
    let token = tokens::generate_refresh_token();
    let expires_at = Utc::now() + Duration::days(config.refresh_token_ttl_days);

    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (user_id, token_hash, expires_at)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(user_id)
    .bind(hash_token(&token))
    .bind(expires_at)
    .execute(&mut **tx)
    .await?;

    Ok((token, config.access_token_ttl_minutes * 60))
}
