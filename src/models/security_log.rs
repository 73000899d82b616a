//! Security audit log models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events recorded in `security_logs.event`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityEvent {
    Register,
    LoginSuccess,
    LoginFailure,
    Logout,
    TokenRefreshFailure,
    RoleChanged,
    UserActivated,
    UserDeactivated,
    SettingUpdated,
}

impl SecurityEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityEvent::Register => "REGISTER",
            SecurityEvent::LoginSuccess => "LOGIN_SUCCESS",
            SecurityEvent::LoginFailure => "LOGIN_FAILURE",
            SecurityEvent::Logout => "LOGOUT",
            SecurityEvent::TokenRefreshFailure => "TOKEN_REFRESH_FAILURE",
            SecurityEvent::RoleChanged => "ROLE_CHANGED",
            SecurityEvent::UserActivated => "USER_ACTIVATED",
            SecurityEvent::UserDeactivated => "USER_DEACTIVATED",
            SecurityEvent::SettingUpdated => "SETTING_UPDATED",
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct SecurityLog {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub event: String,
    pub ip_address: Option<String>,
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Query parameters for `GET /api/v1/admin/security-logs`.
#[derive(Debug, Default, Deserialize)]
pub struct SecurityLogQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub event: Option<String>,
    pub user_id: Option<Uuid>,
}
