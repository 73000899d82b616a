//! Admin panel endpoints under `/api/v1/admin`.
//!
//! Every handler requires ADMIN or SUPERADMIN. Role changes, settings and
//! security logs are SUPERADMIN only.

use axum::{Extension, extract::State};
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    middleware::{auth::AuthContext, client_ip::ClientIp},
    models::{
        analytics::DashboardStats,
        category::{Category, CreateCategoryRequest, UpdateCategoryRequest},
        content::{ContentPage, CreateFaqRequest, Faq, UpdateFaqRequest, UpsertPageRequest},
        report::{Report, ReportQuery, ResolveReportRequest},
        schedule_request::{ScheduleRequestQuery, ScheduleRequestResponse},
        security_log::{SecurityLog, SecurityLogQuery},
        setting::{Setting, UpdateSettingRequest},
        user::{ChangeRoleRequest, ChangeStatusRequest, UserListQuery, UserResponse},
    },
    pagination::Page,
    response::{Ack, ApiJson, ApiPath, ApiQuery, ApiResponse},
    services::{
        analytics_service, category_service, content_service, report_service,
        schedule_service::{self, Scope},
        security_log_service, settings_service, user_admin_service,
    },
};

// Users

pub async fn list_users(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    ApiQuery(query): ApiQuery<UserListQuery>,
) -> Result<ApiResponse<Page<UserResponse>>, AppError> {
    auth.require_admin()?;
    Ok(ApiResponse::ok(user_admin_service::list(&pool, query).await?))
}

/// `PUT /api/v1/admin/users/{id}/role` (SUPERADMIN).
///
/// ```json
/// { "role": "CONTRACTOR" }
/// ```
pub async fn change_user_role(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    ip: ClientIp,
    ApiPath(user_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<ChangeRoleRequest>,
) -> Result<ApiResponse<UserResponse>, AppError> {
    let user =
        user_admin_service::change_role(&pool, &auth, user_id, request.role, ip.as_deref()).await?;
    Ok(ApiResponse::ok(user))
}

/// `PUT /api/v1/admin/users/{id}/status`; deactivating also signs the user out everywhere.
pub async fn change_user_status(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    ip: ClientIp,
    ApiPath(user_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<ChangeStatusRequest>,
) -> Result<ApiResponse<UserResponse>, AppError> {
    let user =
        user_admin_service::set_status(&pool, &auth, user_id, request.is_active, ip.as_deref())
            .await?;
    Ok(ApiResponse::ok(user))
}

// Categories

pub async fn list_categories(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
) -> Result<ApiResponse<Vec<Category>>, AppError> {
    auth.require_admin()?;
    Ok(ApiResponse::ok(category_service::list_all(&pool).await?))
}

pub async fn create_category(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(request): ApiJson<CreateCategoryRequest>,
) -> Result<ApiResponse<Category>, AppError> {
    auth.require_admin()?;
    Ok(ApiResponse::created(category_service::create(&pool, request).await?))
}

pub async fn update_category(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(category_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateCategoryRequest>,
) -> Result<ApiResponse<Category>, AppError> {
    auth.require_admin()?;
    Ok(ApiResponse::ok(
        category_service::update(&pool, category_id, request).await?,
    ))
}

pub async fn delete_category(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(category_id): ApiPath<Uuid>,
) -> Result<ApiResponse<Ack>, AppError> {
    auth.require_admin()?;
    category_service::delete(&pool, category_id).await?;
    Ok(ApiResponse::ok(Ack {
        message: "Category deleted",
    }))
}

// Dashboard

pub async fn analytics(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
) -> Result<ApiResponse<DashboardStats>, AppError> {
    auth.require_admin()?;
    Ok(ApiResponse::ok(analytics_service::dashboard(&pool).await?))
}

pub async fn list_schedule_requests(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    ApiQuery(query): ApiQuery<ScheduleRequestQuery>,
) -> Result<ApiResponse<Page<ScheduleRequestResponse>>, AppError> {
    auth.require_admin()?;
    Ok(ApiResponse::ok(
        schedule_service::list(&pool, Scope::All, query).await?,
    ))
}

// Settings and security logs (SUPERADMIN)

pub async fn list_settings(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
) -> Result<ApiResponse<Vec<Setting>>, AppError> {
    auth.require_superadmin()?;
    Ok(ApiResponse::ok(settings_service::list(&pool).await?))
}

/// `PUT /api/v1/admin/settings/{key}` with `{ "value": <json> }`.
pub async fn update_setting(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    ip: ClientIp,
    ApiPath(key): ApiPath<String>,
    ApiJson(request): ApiJson<UpdateSettingRequest>,
) -> Result<ApiResponse<Setting>, AppError> {
    auth.require_superadmin()?;
    let setting =
        settings_service::upsert(&pool, auth.user_id, &key, request.value, ip.as_deref()).await?;
    Ok(ApiResponse::ok(setting))
}

pub async fn list_security_logs(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    ApiQuery(query): ApiQuery<SecurityLogQuery>,
) -> Result<ApiResponse<Page<SecurityLog>>, AppError> {
    auth.require_superadmin()?;
    Ok(ApiResponse::ok(security_log_service::list(&pool, query).await?))
}

// Reports

pub async fn list_reports(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    ApiQuery(query): ApiQuery<ReportQuery>,
) -> Result<ApiResponse<Page<Report>>, AppError> {
    auth.require_admin()?;
    Ok(ApiResponse::ok(report_service::list(&pool, query).await?))
}

/// `POST /api/v1/admin/reports/{id}/resolve` with `{ "status": "RESOLVED", "note": "..." }`.
pub async fn resolve_report(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(report_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<ResolveReportRequest>,
) -> Result<ApiResponse<Report>, AppError> {
    auth.require_admin()?;
    Ok(ApiResponse::ok(
        report_service::resolve(&pool, &auth, report_id, request).await?,
    ))
}

// Content

pub async fn upsert_page(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(slug): ApiPath<String>,
    ApiJson(request): ApiJson<UpsertPageRequest>,
) -> Result<ApiResponse<ContentPage>, AppError> {
    auth.require_admin()?;
    Ok(ApiResponse::ok(
        content_service::upsert_page(&pool, auth.user_id, &slug, request).await?,
    ))
}

pub async fn list_faqs(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
) -> Result<ApiResponse<Vec<Faq>>, AppError> {
    auth.require_admin()?;
    Ok(ApiResponse::ok(content_service::list_all_faqs(&pool).await?))
}

pub async fn create_faq(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(request): ApiJson<CreateFaqRequest>,
) -> Result<ApiResponse<Faq>, AppError> {
    auth.require_admin()?;
    Ok(ApiResponse::created(content_service::create_faq(&pool, request).await?))
}

pub async fn update_faq(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(faq_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateFaqRequest>,
) -> Result<ApiResponse<Faq>, AppError> {
    auth.require_admin()?;
    Ok(ApiResponse::ok(
        content_service::update_faq(&pool, faq_id, request).await?,
    ))
}

pub async fn delete_faq(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(faq_id): ApiPath<Uuid>,
) -> Result<ApiResponse<Ack>, AppError> {
    auth.require_admin()?;
    content_service::delete_faq(&pool, faq_id).await?;
    Ok(ApiResponse::ok(Ack {
        message: "FAQ deleted",
    }))
}
