//! Pre-aggregated statistics for the admin dashboard.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{schedule_request::ScheduleStatus, user::Role};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RoleCount {
    pub role: Role,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StatusCount {
    pub status: ScheduleStatus,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CategoryCount {
    pub category_id: Uuid,
    pub name: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MonthlyCount {
    pub month: DateTime<Utc>,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TopService {
    pub service_id: Uuid,
    pub title: String,
    pub request_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Totals {
    pub users: i64,
    pub active_services: i64,
    pub categories: i64,
    pub schedule_requests: i64,
    pub open_reports: i64,
}

/// Response body for `GET /api/v1/admin/analytics`.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub totals: Totals,
    pub users_by_role: Vec<RoleCount>,
    pub requests_by_status: Vec<StatusCount>,
    /// `accepted / (accepted + rejected)`, `None` before any decision
    pub acceptance_rate: Option<f64>,
    pub services_by_category: Vec<CategoryCount>,
    pub requests_per_month: Vec<MonthlyCount>,
    pub top_services: Vec<TopService>,
}
