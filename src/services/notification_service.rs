//! In-app notifications.

use sqlx::PgExecutor;
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    models::notification::{NewNotification, Notification, NotificationQuery, UnreadCount},
    pagination::{Page, PageParams},
};

/// Insert a notification; accepts a pool or an open transaction.
pub async fn create<'e, E>(executor: E, notification: NewNotification) -> Result<(), AppError>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO notifications (user_id, kind, title, message, related_id)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(notification.user_id)
    .bind(notification.kind)
    .bind(notification.title)
    .bind(notification.message)
    .bind(notification.related_id)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn list(
    pool: &DbPool,
    user_id: Uuid,
    query: NotificationQuery,
) -> Result<Page<Notification>, AppError> {
    let pagination = PageParams {
        page: query.page,
        limit: query.limit,
    }
    .normalize();

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND (NOT $2 OR NOT is_read)",
    )
    .bind(user_id)
    .bind(query.unread_only)
    .fetch_one(pool)
    .await?;

    let items = sqlx::query_as::<_, Notification>(
        r#"
        SELECT id, user_id, kind, title, message, related_id, is_read, created_at
        FROM notifications
        WHERE user_id = $1 AND (NOT $2 OR NOT is_read)
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(user_id)
    .bind(query.unread_only)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(pool)
    .await?;

    Ok(Page::new(items, &pagination, total))
}

pub async fn unread_count(pool: &DbPool, user_id: Uuid) -> Result<UnreadCount, AppError> {
    let unread: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND NOT is_read")
            .bind(user_id)
            .fetch_one(pool)
            .await?;
    Ok(UnreadCount { unread })
}

/// Mark one of the caller's notifications as read.
pub async fn mark_read(pool: &DbPool, user_id: Uuid, notification_id: Uuid) -> Result<(), AppError> {
    let result =
        sqlx::query("UPDATE notifications SET is_read = true WHERE id = $1 AND user_id = $2")
            .bind(notification_id)
            .bind(user_id)
            .execute(pool)
            .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Notification"));
    }
    Ok(())
}

/// Mark all of the caller's notifications as read; returns how many changed.
pub async fn mark_all_read(pool: &DbPool, user_id: Uuid) -> Result<u64, AppError> {
    let result =
        sqlx::query("UPDATE notifications SET is_read = true WHERE user_id = $1 AND NOT is_read")
            .bind(user_id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected())
}
