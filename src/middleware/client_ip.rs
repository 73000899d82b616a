//! Client address extractor for security logs.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

/// Best-effort client IP taken from `X-Forwarded-For` (first hop) or `X-Real-IP`.
///
/// The API is expected to run behind a reverse proxy that sets these headers.
#[derive(Debug, Clone, Default)]
pub struct ClientIp(pub Option<String>);

impl ClientIp {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        let ip = header("x-forwarded-for")
            .and_then(|v| v.split(',').next().map(|s| s.trim().to_string()))
            .filter(|s| !s.is_empty())
            .or_else(|| header("x-real-ip"));

        Ok(ClientIp(ip))
    }
}
