//! Platform settings stored as JSON values by key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether new accounts can register (bool, default true).
pub const REGISTRATION_ENABLED: &str = "registration_enabled";

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Setting {
    pub key: String,
    pub value: serde_json::Value,
    pub updated_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for `PUT /api/v1/admin/settings/{key}`.
#[derive(Debug, Deserialize)]
pub struct UpdateSettingRequest {
    pub value: serde_json::Value,
}
