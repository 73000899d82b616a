//! Authentication HTTP handlers.
//!
//! This module implements the auth-related API endpoints:
//! - POST /api/v1/auth/register - Create an account and sign in
//! - POST /api/v1/auth/login - Exchange credentials for a token pair
//! - POST /api/v1/auth/refresh - Rotate a refresh token
//! - POST /api/v1/auth/logout - Revoke a refresh token
//! - GET /api/v1/auth/me - Current user
//! - PUT /api/v1/users/me - Update own profile

use axum::{Extension, extract::State};

use crate::{
    db::DbPool,
    error::AppError,
    middleware::{auth::AuthContext, client_ip::ClientIp},
    models::user::{
        AuthResponse, LoginRequest, RefreshRequest, RegisterRequest, UpdateProfileRequest,
        UserResponse,
    },
    response::{Ack, ApiJson, ApiResponse},
    services::auth_service,
    state::AppState,
};

/// Register a new account.
///
/// # Endpoint
///
/// `POST /api/v1/auth/register`
///
/// # Request Body
///
/// The registration wizard's fields, see [`RegisterRequest`].
///
/// # Response
///
/// - **Success (201 Created)**: user plus access and refresh tokens
/// - **Error (400)**: `VALIDATION_ERROR` listing every failing field
/// - **Error (403)**: registrations disabled
/// - **Error (409)**: email already registered
pub async fn register(
    State(state): State<AppState>,
    ip: ClientIp,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<ApiResponse<AuthResponse>, AppError> {
    let session = auth_service::register(&state.pool, &state.config, request, ip.as_deref()).await?;
    Ok(ApiResponse::created(session))
}

/// Sign in with email and password.
///
/// # Endpoint
///
/// `POST /api/v1/auth/login`
///
/// # Response
///
/// - **Success (200 OK)**: user plus access and refresh tokens
/// - **Error (401)**: `INVALID_CREDENTIALS`
/// - **Error (403)**: `ACCOUNT_DISABLED`
pub async fn login(
    State(state): State<AppState>,
    ip: ClientIp,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<ApiResponse<AuthResponse>, AppError> {
    let session = auth_service::login(
        &state.pool,
        &state.config,
        &request.email,
        &request.password,
        ip.as_deref(),
    )
    .await?;
    Ok(ApiResponse::ok(session))
}

/// Exchange a refresh token for a new pair. The presented token is revoked.
pub async fn refresh(
    State(state): State<AppState>,
    ip: ClientIp,
    ApiJson(request): ApiJson<RefreshRequest>,
) -> Result<ApiResponse<AuthResponse>, AppError> {
    let session =
        auth_service::refresh(&state.pool, &state.config, &request.refresh_token, ip.as_deref())
            .await?;
    Ok(ApiResponse::ok(session))
}

/// Revoke a refresh token. Always succeeds for well-formed requests.
pub async fn logout(
    State(pool): State<DbPool>,
    ip: ClientIp,
    ApiJson(request): ApiJson<RefreshRequest>,
) -> Result<ApiResponse<Ack>, AppError> {
    auth_service::logout(&pool, &request.refresh_token, ip.as_deref()).await?;
    Ok(ApiResponse::ok(Ack {
        message: "Logged out",
    }))
}

pub async fn me(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
) -> Result<ApiResponse<UserResponse>, AppError> {
    let user = auth_service::find_user(&pool, auth.user_id).await?;
    Ok(ApiResponse::ok(user.into()))
}

/// Update names, phone or avatar of the caller.
pub async fn update_me(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(request): ApiJson<UpdateProfileRequest>,
) -> Result<ApiResponse<UserResponse>, AppError> {
    let user = auth_service::update_profile(&pool, auth.user_id, request).await?;
    Ok(ApiResponse::ok(user))
}
