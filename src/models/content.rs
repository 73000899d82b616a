//! Static content: FAQ entries and the terms / privacy / contact pages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Slugs of the editable content pages.
pub const PAGE_SLUGS: [&str; 3] = ["terms", "privacy", "contact"];

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct ContentPage {
    pub slug: String,
    pub title: String,
    pub body: String,
    pub updated_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Faq {
    pub id: Uuid,
    pub question: String,
    pub answer: String,
    pub position: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for `PUT /api/v1/admin/content/{slug}`.
#[derive(Debug, Deserialize)]
pub struct UpsertPageRequest {
    pub title: String,
    pub body: String,
}

/// Request body for `POST /api/v1/admin/faqs`.
#[derive(Debug, Deserialize)]
pub struct CreateFaqRequest {
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub position: i32,
}

/// Request body for `PUT /api/v1/admin/faqs/{id}`. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateFaqRequest {
    pub question: Option<String>,
    pub answer: Option<String>,
    pub position: Option<i32>,
    pub is_active: Option<bool>,
}
