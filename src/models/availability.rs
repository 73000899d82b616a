//! Availability slot models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A time window in which a service can be booked.
///
/// `is_booked` flips to true when a schedule request for the slot is accepted.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Availability {
    pub id: Uuid,
    pub service_id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub is_booked: bool,
    pub created_at: DateTime<Utc>,
}

/// Request body for `POST /api/v1/services/{id}/availability`.
#[derive(Debug, Deserialize)]
pub struct CreateAvailabilityRequest {
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}
