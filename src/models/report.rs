//! Abuse report models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Report status, stored as the `report_status` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "report_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    Open,
    Resolved,
    Dismissed,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Open => "OPEN",
            ReportStatus::Resolved => "RESOLVED",
            ReportStatus::Dismissed => "DISMISSED",
        }
    }
}

/// Represents a report record from the database.
///
/// Exactly one of `service_id` / `reported_user_id` is set (CHECK constraint).
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Report {
    pub id: Uuid,
    pub reporter_id: Uuid,
    pub service_id: Option<Uuid>,
    pub reported_user_id: Option<Uuid>,
    pub reason: String,
    pub details: Option<String>,
    pub status: ReportStatus,
    pub resolution_note: Option<String>,
    pub resolved_by: Option<Uuid>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Request body for `POST /api/v1/reports`.
#[derive(Debug, Deserialize)]
pub struct CreateReportRequest {
    pub service_id: Option<Uuid>,
    pub reported_user_id: Option<Uuid>,
    pub reason: String,
    pub details: Option<String>,
}

/// Request body for `POST /api/v1/admin/reports/{id}/resolve`.
///
/// `status` must be `RESOLVED` or `DISMISSED`.
#[derive(Debug, Deserialize)]
pub struct ResolveReportRequest {
    pub status: ReportStatus,
    pub note: Option<String>,
}

/// Query parameters for the admin report list.
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<ReportStatus>,
}
