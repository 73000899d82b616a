//! Platform settings (key -> JSON value).

use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    models::{
        security_log::SecurityEvent,
        setting::{REGISTRATION_ENABLED, Setting},
    },
    services::security_log_service,
};

/// Keys the platform understands, with the JSON type they must hold.
const KNOWN_BOOL_KEYS: [&str; 1] = [REGISTRATION_ENABLED];

pub async fn list(pool: &DbPool) -> Result<Vec<Setting>, AppError> {
    let settings = sqlx::query_as::<_, Setting>(
        "SELECT key, value, updated_by, updated_at FROM settings ORDER BY key",
    )
    .fetch_all(pool)
    .await?;
    Ok(settings)
}

/// Read a boolean setting, falling back to `default` when unset or not a bool.
pub async fn get_bool(pool: &DbPool, key: &str, default: bool) -> Result<bool, AppError> {
    let value: Option<serde_json::Value> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = $1")
            .bind(key)
            .fetch_optional(pool)
            .await?;
    Ok(value.and_then(|v| v.as_bool()).unwrap_or(default))
}

/// Insert or replace a setting and record who changed it.
pub async fn upsert(
    pool: &DbPool,
    actor_id: Uuid,
    key: &str,
    value: serde_json::Value,
    ip: Option<&str>,
) -> Result<Setting, AppError> {
    validate(key, &value)?;

    let mut tx = pool.begin().await?;

    let setting = sqlx::query_as::<_, Setting>(
        r#"
        INSERT INTO settings (key, value, updated_by, updated_at)
        VALUES ($1, $2, $3, NOW())
        ON CONFLICT (key) DO UPDATE
            SET value = EXCLUDED.value, updated_by = EXCLUDED.updated_by, updated_at = NOW()
        RETURNING key, value, updated_by, updated_at
        "#,
    )
    .bind(key)
    .bind(&value)
    .bind(actor_id)
    .fetch_one(&mut *tx)
    .await?;

    security_log_service::record(
        &mut *tx,
        SecurityEvent::SettingUpdated,
        Some(actor_id),
        ip,
        Some(serde_json::json!({ "key": key, "value": value })),
    )
    .await?;

    tx.commit().await?;
    Ok(setting)
}

fn validate(key: &str, value: &serde_json::Value) -> Result<(), AppError> {
    let key_ok = !key.is_empty()
        && key.len() <= 64
        && key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if !key_ok {
        return Err(AppError::InvalidRequest(
            "Setting keys use lowercase letters, digits and underscores".to_string(),
        ));
    }
    if KNOWN_BOOL_KEYS.contains(&key) && !value.is_boolean() {
        return Err(AppError::InvalidRequest(format!("{key} must be a boolean")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn known_keys_are_type_checked() {
        assert!(validate(REGISTRATION_ENABLED, &json!(false)).is_ok());
        assert!(validate(REGISTRATION_ENABLED, &json!("no")).is_err());
    }

    #[test]
    fn key_format() {
        assert!(validate("support_email", &json!("a@b.uy")).is_ok());
        assert!(validate("Support-Email", &json!("a@b.uy")).is_err());
        assert!(validate("", &json!(1)).is_err());
    }
}
