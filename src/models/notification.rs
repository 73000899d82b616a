//! In-app notification models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Notification kinds written by the schedule request workflow.
pub mod kind {
    pub const SCHEDULE_REQUESTED: &str = "SCHEDULE_REQUESTED";
    pub const SCHEDULE_ACCEPTED: &str = "SCHEDULE_ACCEPTED";
    pub const SCHEDULE_REJECTED: &str = "SCHEDULE_REJECTED";
    pub const SCHEDULE_CANCELLED: &str = "SCHEDULE_CANCELLED";
}

/// Represents a notification record from the database.
///
/// `related_id` points at the entity the notification is about (for the
/// schedule workflow, the schedule request id).
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub related_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Notification to be inserted.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub kind: &'static str,
    pub title: String,
    pub message: String,
    pub related_id: Option<Uuid>,
}

/// Query parameters for `GET /api/v1/notifications`.
#[derive(Debug, Default, Deserialize)]
pub struct NotificationQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub unread: i64,
}
