//! Security audit log.
//!
//! Auth and admin operations append a row per event; SUPERADMIN users can
//! page through them.

use sqlx::PgExecutor;
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    models::security_log::{SecurityEvent, SecurityLog, SecurityLogQuery},
    pagination::{Page, PageParams},
};

/// Append a security event; accepts a pool or an open transaction.
pub async fn record<'e, E>(
    executor: E,
    event: SecurityEvent,
    user_id: Option<Uuid>,
    ip_address: Option<&str>,
    details: Option<serde_json::Value>,
) -> Result<(), AppError>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO security_logs (user_id, event, ip_address, details)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(user_id)
    .bind(event.as_str())
    .bind(ip_address)
    .bind(details)
    .execute(executor)
    .await?;

    tracing::info!(event = event.as_str(), user_id = ?user_id, ip = ?ip_address, "security_event");
    Ok(())
}

/// Newest first, optionally filtered by event name and user.
pub async fn list(pool: &DbPool, query: SecurityLogQuery) -> Result<Page<SecurityLog>, AppError> {
    let pagination = PageParams {
        page: query.page,
        limit: query.limit,
    }
    .normalize();
    let event = query.event.map(|e| e.trim().to_uppercase());

    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM security_logs
        WHERE ($1::text IS NULL OR event = $1)
          AND ($2::uuid IS NULL OR user_id = $2)
        "#,
    )
    .bind(&event)
    .bind(query.user_id)
    .fetch_one(pool)
    .await?;

    let items = sqlx::query_as::<_, SecurityLog>(
        r#"
        SELECT id, user_id, event, ip_address, details, created_at
        FROM security_logs
        WHERE ($1::text IS NULL OR event = $1)
          AND ($2::uuid IS NULL OR user_id = $2)
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(&event)
    .bind(query.user_id)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(pool)
    .await?;

    Ok(Page::new(items, &pagination, total))
}
