//! OAuth provider status and authorization redirect.

use std::sync::Arc;

use axum::{extract::State, response::Redirect};

use crate::{
    config::Config,
    error::AppError,
    response::{ApiPath, ApiResponse},
    services::oauth_service::{self, OAuthStatus, Provider},
};

/// Which social logins the frontend should offer.
///
/// `GET /api/v1/oauth/status` → `{ "google": true, "facebook": false }`
pub async fn status(State(config): State<Arc<Config>>) -> ApiResponse<OAuthStatus> {
    ApiResponse::ok(oauth_service::status(&config))
}

/// `GET /api/v1/oauth/{provider}` → 307 to the provider's consent screen.
///
/// Unknown providers are 404; known but unconfigured ones are 503
/// `PROVIDER_UNAVAILABLE`.
pub async fn authorize(
    State(config): State<Arc<Config>>,
    ApiPath(provider): ApiPath<String>,
) -> Result<Redirect, AppError> {
    let provider = Provider::parse(&provider)?;
    let url = oauth_service::authorize_url(&config, provider)?;
    Ok(Redirect::temporary(url.as_str()))
}
