//! Service listing models.
//!
//! A service is a listing published by a contractor: an agricultural task,
//! a price per unit and the department where it is offered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pagination::PageMeta;

/// Represents a service joined with its category and contractor names.
///
/// # Database Table
///
/// Maps to the `services` table. Prices are stored as `i64` cents (UYU) to
/// avoid floating-point errors. Deleting a service only clears `is_active`.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Service {
    pub id: Uuid,
    pub contractor_id: Uuid,
    pub contractor_name: String,
    pub category_id: Uuid,
    pub category_name: String,
    pub title: String,
    pub description: String,
    pub price_cents: i64,
    pub price_unit: String,
    pub department: String,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub image_urls: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `SELECT` clause producing [`Service`] rows; append `WHERE ...` to it.
pub const SERVICE_SELECT: &str = r#"
    SELECT s.id, s.contractor_id, u.first_name || ' ' || u.last_name AS contractor_name,
           s.category_id, c.name AS category_name, s.title, s.description,
           s.price_cents, s.price_unit, s.department, s.city, s.latitude, s.longitude,
           s.image_urls, s.is_active, s.created_at, s.updated_at
    FROM services s
    JOIN users u ON u.id = s.contractor_id
    JOIN categories c ON c.id = s.category_id
"#;

/// Request body for `POST /api/v1/services`.
///
/// # JSON Example
///
/// ```json
/// {
///   "category_id": "550e8400-e29b-41d4-a716-446655440000",
///   "title": "Cosecha de soja",
///   "description": "Cosechadora con plataforma de 30 pies",
///   "price_cents": 450000,
///   "price_unit": "hectárea",
///   "department": "Soriano",
///   "city": "Mercedes"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct CreateServiceRequest {
    pub category_id: Uuid,
    pub title: String,
    pub description: String,
    pub price_cents: i64,
    pub price_unit: String,
    pub department: String,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub image_urls: Vec<String>,
}

/// Request body for `PUT /api/v1/services/{id}`. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateServiceRequest {
    pub category_id: Option<Uuid>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub price_unit: Option<String>,
    pub department: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub image_urls: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

/// Filters accepted by `GET /api/v1/services`.
#[derive(Debug, Default, Deserialize)]
pub struct ServiceFilters {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub category_id: Option<Uuid>,
    pub department: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub search: Option<String>,
    pub contractor_id: Option<Uuid>,
}

/// Category option in the listing facets.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct CategoryFacet {
    pub id: Uuid,
    pub name: String,
    pub count: i64,
}

/// Filter options for the listing UI.
///
/// Computed over every active service rather than the current page, so the
/// option sets stay stable while the client pages through results.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceFacets {
    pub departments: Vec<String>,
    pub categories: Vec<CategoryFacet>,
}

/// Response body for `GET /api/v1/services`.
#[derive(Debug, Serialize)]
pub struct ServiceListResponse {
    pub items: Vec<Service>,
    pub pagination: PageMeta,
    pub facets: ServiceFacets,
}
