//! `GET /health` for load balancers and uptime checks.

use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    db::{self, DbPool},
    error::AppError,
    response::ApiResponse,
};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub version: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// Reports `healthy` once the database answers; a database failure surfaces
/// as the usual `INTERNAL_ERROR` envelope with status 500.
///
/// ```json
/// { "success": true, "data": { "status": "healthy", "database": "connected", "version": "0.1.0", "timestamp": "..." } }
/// ```
pub async fn health_check(
    State(pool): State<DbPool>,
) -> Result<ApiResponse<HealthResponse>, AppError> {
    db::ping(&pool).await?;

    Ok(ApiResponse::ok(HealthResponse {
        status: "healthy",
        database: "connected",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now(),
    }))
}
