//! Service category models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a category record from the database.
///
/// Category names are unique case-insensitively (`LOWER(name)` unique index).
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub icon_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Category with the number of active services in it, for public listings.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct CategoryWithCount {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub icon_url: Option<String>,
    pub service_count: i64,
}

/// Request body for `POST /api/v1/admin/categories`.
#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
    pub icon_url: Option<String>,
}

/// Request body for `PUT /api/v1/admin/categories/{id}`. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub icon_url: Option<String>,
    pub is_active: Option<bool>,
}
