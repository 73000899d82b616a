//! Notification endpoints for the signed-in user.

use axum::{Extension, extract::State};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    middleware::auth::AuthContext,
    models::notification::{Notification, NotificationQuery, UnreadCount},
    pagination::Page,
    response::{Ack, ApiPath, ApiQuery, ApiResponse},
    services::notification_service,
};

pub async fn list(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    ApiQuery(query): ApiQuery<NotificationQuery>,
) -> Result<ApiResponse<Page<Notification>>, AppError> {
    let page = notification_service::list(&pool, auth.user_id, query).await?;
    Ok(ApiResponse::ok(page))
}

pub async fn unread_count(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
) -> Result<ApiResponse<UnreadCount>, AppError> {
    let count = notification_service::unread_count(&pool, auth.user_id).await?;
    Ok(ApiResponse::ok(count))
}

pub async fn mark_read(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(notification_id): ApiPath<Uuid>,
) -> Result<ApiResponse<Ack>, AppError> {
    notification_service::mark_read(&pool, auth.user_id, notification_id).await?;
    Ok(ApiResponse::ok(Ack {
        message: "Notification marked as read",
    }))
}

#[derive(Debug, Serialize)]
pub struct MarkedRead {
    pub updated: u64,
}

pub async fn mark_all_read(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
) -> Result<ApiResponse<MarkedRead>, AppError> {
    let updated = notification_service::mark_all_read(&pool, auth.user_id).await?;
    Ok(ApiResponse::ok(MarkedRead { updated }))
}
