//! Public content and user reports.
//!
//! - GET /api/v1/content/faq
//! - GET /api/v1/content/{slug} (terms, privacy, contact)
//! - POST /api/v1/reports

use axum::{Extension, extract::State};

use crate::{
    db::DbPool,
    error::AppError,
    middleware::auth::AuthContext,
    models::{
        content::{ContentPage, Faq},
        report::{CreateReportRequest, Report},
    },
    response::{ApiJson, ApiPath, ApiResponse},
    services::{content_service, report_service},
};

pub async fn list_faq(State(pool): State<DbPool>) -> Result<ApiResponse<Vec<Faq>>, AppError> {
    Ok(ApiResponse::ok(content_service::list_faqs(&pool).await?))
}

pub async fn get_page(
    State(pool): State<DbPool>,
    ApiPath(slug): ApiPath<String>,
) -> Result<ApiResponse<ContentPage>, AppError> {
    Ok(ApiResponse::ok(content_service::get_page(&pool, &slug).await?))
}

/// Report a service or a user.
///
/// # Request Body
///
/// ```json
/// { "service_id": "...", "reason": "Precio engañoso", "details": "..." }
/// ```
///
/// Exactly one of `service_id` / `reported_user_id` must be sent.
pub async fn create_report(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(request): ApiJson<CreateReportRequest>,
) -> Result<ApiResponse<Report>, AppError> {
    let report = report_service::create(&pool, &auth, request).await?;
    Ok(ApiResponse::created(report))
}
