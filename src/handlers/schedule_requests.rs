//! Schedule request (booking) HTTP handlers.
//!
//! This module implements the booking workflow endpoints:
//! - POST /api/v1/schedule-requests - Request a service
//! - GET /api/v1/schedule-requests - Requests I made (also served at /bookings)
//! - GET /api/v1/schedule-requests/incoming - Requests for my services
//! - GET /api/v1/schedule-requests/{id} - One request (parties and admins)
//! - POST /api/v1/schedule-requests/{id}/accept|reject|cancel - Transitions

use axum::{Extension, body::Bytes, extract::State};
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    middleware::auth::AuthContext,
    models::schedule_request::{
        CreateScheduleRequest, RespondRequest, ScheduleAction, ScheduleRequestQuery,
        ScheduleRequestResponse,
    },
    pagination::Page,
    response::{ApiJson, ApiPath, ApiQuery, ApiResponse},
    services::schedule_service::{self, Scope},
};

/// Create a schedule request.
///
/// # Endpoint
///
/// `POST /api/v1/schedule-requests`
///
/// # Request Body
///
/// ```json
/// {
///   "service_id": "550e8400-e29b-41d4-a716-446655440000",
///   "availability_id": "660e8400-e29b-41d4-a716-446655440001",
///   "message": "Son 120 hectáreas cerca de Young"
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: the request, status `PENDING`, contact hidden
/// - **Error (403)**: requesting your own service
/// - **Error (404)**: service or slot not found
/// - **Error (409)**: slot already booked, or a pending request already exists
pub async fn create(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(request): ApiJson<CreateScheduleRequest>,
) -> Result<ApiResponse<ScheduleRequestResponse>, AppError> {
    let created = schedule_service::create(&pool, &auth, request).await?;
    Ok(ApiResponse::created(created))
}

/// Requests made by the caller, newest first.
pub async fn list_mine(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    ApiQuery(query): ApiQuery<ScheduleRequestQuery>,
) -> Result<ApiResponse<Page<ScheduleRequestResponse>>, AppError> {
    let page = schedule_service::list(&pool, Scope::Requester(auth.user_id), query).await?;
    Ok(ApiResponse::ok(page))
}

/// Requests for services the caller publishes.
pub async fn list_incoming(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    ApiQuery(query): ApiQuery<ScheduleRequestQuery>,
) -> Result<ApiResponse<Page<ScheduleRequestResponse>>, AppError> {
    let page = schedule_service::list(&pool, Scope::Contractor(auth.user_id), query).await?;
    Ok(ApiResponse::ok(page))
}

pub async fn get(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(request_id): ApiPath<Uuid>,
) -> Result<ApiResponse<ScheduleRequestResponse>, AppError> {
    let request = schedule_service::get(&pool, &auth, request_id).await?;
    Ok(ApiResponse::ok(request))
}

/// The transition body is optional; an empty body means no note.
fn parse_note(body: &Bytes) -> Result<Option<String>, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let request: RespondRequest = serde_json::from_slice(body)
        .map_err(|e| AppError::InvalidRequest(format!("Invalid JSON body: {e}")))?;
    Ok(request.note)
}

async fn respond(
    pool: &DbPool,
    auth: &AuthContext,
    request_id: Uuid,
    action: ScheduleAction,
    body: &Bytes,
) -> Result<ApiResponse<ScheduleRequestResponse>, AppError> {
    let note = parse_note(body)?;
    let updated = schedule_service::respond(pool, auth, request_id, action, note).await?;
    Ok(ApiResponse::ok(updated))
}

/// Accept a pending request (contractor of the service or admin).
///
/// # Endpoint
///
/// `POST /api/v1/schedule-requests/{id}/accept`
///
/// Body is optional: `{ "note": "Paso el martes a las 8" }`.
///
/// # Response
///
/// - **Success (200 OK)**: the request, now `ACCEPTED`, with both parties' contact details
/// - **Error (409)**: `INVALID_TRANSITION` if already rejected/cancelled,
///   `CONFLICT` if the slot was booked meanwhile
pub async fn accept(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(request_id): ApiPath<Uuid>,
    body: Bytes,
) -> Result<ApiResponse<ScheduleRequestResponse>, AppError> {
    respond(&pool, &auth, request_id, ScheduleAction::Accept, &body).await
}

/// Reject a pending request (contractor of the service or admin).
pub async fn reject(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(request_id): ApiPath<Uuid>,
    body: Bytes,
) -> Result<ApiResponse<ScheduleRequestResponse>, AppError> {
    respond(&pool, &auth, request_id, ScheduleAction::Reject, &body).await
}

/// Cancel one of the caller's pending requests.
pub async fn cancel(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(request_id): ApiPath<Uuid>,
    body: Bytes,
) -> Result<ApiResponse<ScheduleRequestResponse>, AppError> {
    respond(&pool, &auth, request_id, ScheduleAction::Cancel, &body).await
}
