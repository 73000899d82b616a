//! Public catalog handlers: categories, services and availability.
//!
//! - GET /api/v1/categories
//! - GET /api/v1/services (filters, pagination, facets)
//! - GET /api/v1/services/mine
//! - GET/PUT/DELETE /api/v1/services/{id}
//! - POST /api/v1/services
//! - GET/POST /api/v1/services/{id}/availability
//! - DELETE /api/v1/availability/{id}

use axum::{Extension, extract::State};
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    middleware::auth::{AuthContext, MaybeAuth},
    models::{
        availability::{Availability, CreateAvailabilityRequest},
        category::CategoryWithCount,
        service::{
            CreateServiceRequest, Service, ServiceFilters, ServiceListResponse,
            UpdateServiceRequest,
        },
    },
    pagination::{Page, PageParams},
    response::{Ack, ApiJson, ApiPath, ApiQuery, ApiResponse},
    services::{availability_service, catalog_service, category_service},
};

pub async fn list_categories(
    State(pool): State<DbPool>,
) -> Result<ApiResponse<Vec<CategoryWithCount>>, AppError> {
    Ok(ApiResponse::ok(category_service::list_public(&pool).await?))
}

/// List active services.
///
/// # Endpoint
///
/// `GET /api/v1/services?page=1&limit=12&category_id=...&department=Soriano&min_price=0&max_price=500000&search=cosecha`
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "success": true,
///   "data": {
///     "items": [ { "id": "...", "title": "Cosecha de soja", ... } ],
///     "pagination": { "page": 1, "limit": 12, "total": 40, "total_pages": 4, "has_more": true },
///     "facets": {
///       "departments": ["Colonia", "Soriano"],
///       "categories": [ { "id": "...", "name": "Cosecha", "count": 12 } ]
///     }
///   }
/// }
/// ```
pub async fn list_services(
    State(pool): State<DbPool>,
    ApiQuery(filters): ApiQuery<ServiceFilters>,
) -> Result<ApiResponse<ServiceListResponse>, AppError> {
    Ok(ApiResponse::ok(catalog_service::list(&pool, filters).await?))
}

/// Inactive services are visible only to their owner and admins.
pub async fn get_service(
    State(pool): State<DbPool>,
    MaybeAuth(viewer): MaybeAuth,
    ApiPath(service_id): ApiPath<Uuid>,
) -> Result<ApiResponse<Service>, AppError> {
    let service = catalog_service::get(&pool, service_id, viewer.as_ref()).await?;
    Ok(ApiResponse::ok(service))
}

pub async fn my_services(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<ApiResponse<Page<Service>>, AppError> {
    let page = catalog_service::list_mine(&pool, auth.user_id, params).await?;
    Ok(ApiResponse::ok(page))
}

/// Publish a service.
///
/// # Endpoint
///
/// `POST /api/v1/services` (CONTRACTOR, ADMIN, SUPERADMIN)
///
/// # Response
///
/// - **Success (201 Created)**: the created service
/// - **Error (400)**: `VALIDATION_ERROR`
/// - **Error (403)**: caller cannot publish
pub async fn create_service(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(request): ApiJson<CreateServiceRequest>,
) -> Result<ApiResponse<Service>, AppError> {
    let service = catalog_service::create(&pool, &auth, request).await?;
    Ok(ApiResponse::created(service))
}

pub async fn update_service(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(service_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateServiceRequest>,
) -> Result<ApiResponse<Service>, AppError> {
    let service = catalog_service::update(&pool, &auth, service_id, request).await?;
    Ok(ApiResponse::ok(service))
}

/// Soft delete.
pub async fn delete_service(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(service_id): ApiPath<Uuid>,
) -> Result<ApiResponse<Ack>, AppError> {
    catalog_service::deactivate(&pool, &auth, service_id).await?;
    Ok(ApiResponse::ok(Ack {
        message: "Service removed",
    }))
}

pub async fn list_availability(
    State(pool): State<DbPool>,
    MaybeAuth(viewer): MaybeAuth,
    ApiPath(service_id): ApiPath<Uuid>,
) -> Result<ApiResponse<Vec<Availability>>, AppError> {
    let slots = availability_service::list_upcoming(&pool, service_id, viewer.as_ref()).await?;
    Ok(ApiResponse::ok(slots))
}

pub async fn create_availability(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(service_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<CreateAvailabilityRequest>,
) -> Result<ApiResponse<Availability>, AppError> {
    let slot = availability_service::create(&pool, &auth, service_id, request).await?;
    Ok(ApiResponse::created(slot))
}

pub async fn delete_availability(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(slot_id): ApiPath<Uuid>,
) -> Result<ApiResponse<Ack>, AppError> {
    availability_service::delete(&pool, &auth, slot_id).await?;
    Ok(ApiResponse::ok(Ack {
        message: "Slot removed",
    }))
}
