//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to deserialize environment variables into a type-safe struct.

use serde::Deserialize;

/// Minimum accepted length of `JWT_SECRET` in bytes.
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): PostgreSQL connection string
/// - `JWT_SECRET` (required): HMAC key for access tokens, at least 32 bytes
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `DB_MAX_CONNECTIONS` (optional): pool size, defaults to 5
/// - `ACCESS_TOKEN_TTL_MINUTES` / `REFRESH_TOKEN_TTL_DAYS` (optional): token lifetimes
/// - `UPLOAD_DIR`, `PUBLIC_BASE_URL`, `MAX_UPLOAD_BYTES` (optional): file uploads
/// - `CORS_ALLOWED_ORIGIN` (optional): single allowed origin, permissive when unset
/// - `GOOGLE_*` / `FACEBOOK_*` (optional): OAuth providers, disabled when unset
/// - `SUPERADMIN_EMAIL` / `SUPERADMIN_PASSWORD`: only read by the seed binary
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,

    pub jwt_secret: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_max_connections")]
    pub db_max_connections: u32,

    #[serde(default = "default_access_ttl")]
    pub access_token_ttl_minutes: i64,

    #[serde(default = "default_refresh_ttl")]
    pub refresh_token_ttl_days: i64,

    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,

    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    pub cors_allowed_origin: Option<String>,

    pub google_client_id: Option<String>,
    pub google_redirect_uri: Option<String>,
    pub facebook_client_id: Option<String>,
    pub facebook_redirect_uri: Option<String>,

    pub superadmin_email: Option<String>,
    pub superadmin_password: Option<String>,

    #[serde(default)]
    pub seed_sample_data: bool,
}

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Env(#[from] envy::Error),

    #[error("JWT_SECRET must be at least {MIN_JWT_SECRET_LEN} bytes")]
    WeakJwtSecret,
}

fn default_port() -> u16 {
    3000
}

fn default_max_connections() -> u32 {
    5
}

fn default_access_ttl() -> i64 {
    15
}

fn default_refresh_ttl() -> i64 {
    7
}

fn default_upload_dir() -> String {
    "uploads".to_string()
}

fn default_public_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_max_upload_bytes() -> usize {
    5 * 1024 * 1024
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing (e.g., DATABASE_URL, JWT_SECRET)
    /// - Environment variable values cannot be parsed into expected types
    /// - JWT_SECRET is shorter than 32 bytes
    pub fn from_env() -> Result<Self, ConfigError> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        // Field names are automatically converted: database_url -> DATABASE_URL
        let config = envy::from_env::<Config>()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::WeakJwtSecret);
        }
        Ok(())
    }

    /// Base URL under which uploaded files are served, without trailing slash.
    pub fn uploads_base_url(&self) -> String {
        format!("{}/uploads", self.public_base_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
impl Config {
    /// Configuration suitable for unit and router tests.
    pub fn for_tests() -> Self {
        Self {
            database_url: "postgres://localhost/agrored_test".to_string(),
            jwt_secret: "test-secret-test-secret-test-secret".to_string(),
            server_port: default_port(),
            db_max_connections: default_max_connections(),
            access_token_ttl_minutes: default_access_ttl(),
            refresh_token_ttl_days: default_refresh_ttl(),
            upload_dir: std::env::temp_dir().join("agrored-uploads").display().to_string(),
            public_base_url: "http://localhost:3000/".to_string(),
            max_upload_bytes: 1024,
            cors_allowed_origin: None,
            google_client_id: Some("google-client".to_string()),
            google_redirect_uri: Some("http://localhost:3000/api/v1/oauth/google/callback".to_string()),
            facebook_client_id: None,
            facebook_redirect_uri: None,
            superadmin_email: None,
            superadmin_password: None,
            seed_sample_data: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_jwt_secret() {
        let mut config = Config::for_tests();
        config.jwt_secret = "short".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::WeakJwtSecret)));
    }

    #[test]
    fn uploads_base_url_trims_trailing_slash() {
        let config = Config::for_tests();
        assert_eq!(config.uploads_base_url(), "http://localhost:3000/uploads");
    }
}
