//! OAuth provider availability and authorization redirects.
//!
//! Only the first leg of the flow lives here: building the provider's
//! authorize URL. The callback is handled by the frontend deployment.

use serde::Serialize;
use url::Url;

use crate::{config::Config, error::AppError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Google,
    Facebook,
}

impl Provider {
    /// Parse a provider path segment; unknown names are `NotFound`.
    pub fn parse(name: &str) -> Result<Self, AppError> {
        match name.to_ascii_lowercase().as_str() {
            "google" => Ok(Provider::Google),
            "facebook" => Ok(Provider::Facebook),
            _ => Err(AppError::NotFound("OAuth provider")),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::Facebook => "facebook",
        }
    }

    fn authorize_endpoint(&self) -> &'static str {
        match self {
            Provider::Google => "https://accounts.google.com/o/oauth2/v2/auth",
            Provider::Facebook => "https://www.facebook.com/v19.0/dialog/oauth",
        }
    }

    fn scope(&self) -> &'static str {
        match self {
            Provider::Google => "openid email profile",
            Provider::Facebook => "email,public_profile",
        }
    }

    /// Client id and redirect URI, when both are configured.
    fn credentials<'a>(&self, config: &'a Config) -> Option<(&'a str, &'a str)> {
        let (client_id, redirect_uri) = match self {
            Provider::Google => (&config.google_client_id, &config.google_redirect_uri),
            Provider::Facebook => (&config.facebook_client_id, &config.facebook_redirect_uri),
        };
        match (client_id.as_deref(), redirect_uri.as_deref()) {
            (Some(id), Some(uri)) if !id.is_empty() && !uri.is_empty() => Some((id, uri)),
            _ => None,
        }
    }
}

/// Response body for `GET /api/v1/oauth/status`.
#[derive(Debug, Serialize)]
pub struct OAuthStatus {
    pub google: bool,
    pub facebook: bool,
}

pub fn status(config: &Config) -> OAuthStatus {
    OAuthStatus {
        google: Provider::Google.credentials(config).is_some(),
        facebook: Provider::Facebook.credentials(config).is_some(),
    }
}

/// Authorize URL for `provider` with a fresh random `state`.
///
/// # Errors
///
/// - `ProviderUnavailable`: the provider has no client id / redirect URI configured
pub fn authorize_url(config: &Config, provider: Provider) -> Result<Url, AppError> {
    let (client_id, redirect_uri) = provider
        .credentials(config)
        .ok_or_else(|| AppError::ProviderUnavailable(provider.as_str().to_string()))?;

    let state = hex::encode(rand::random::<[u8; 16]>());

    let mut url = Url::parse(provider.authorize_endpoint())
        .map_err(|e| AppError::Internal(format!("authorize endpoint: {e}")))?;
    url.query_pairs_mut()
        .append_pair("client_id", client_id)
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("response_type", "code")
        .append_pair("scope", provider.scope())
        .append_pair("state", &state);

    tracing::debug!(provider = provider.as_str(), "oauth_redirect_issued");
    Ok(url)
}
