//! Schedule request workflow.
//!
//! This service handles:
//! - Creating requests against a service (optionally for a specific slot)
//! - Listing requests per requester, per contractor and for admins
//! - Accept / reject / cancel transitions with permission checks
//! - Booking the slot on acceptance and notifying the other party
//!
//! # Consistency
//!
//! Transitions lock the request row (`FOR UPDATE`) and update with
//! `WHERE status = 'PENDING'`, so two concurrent decisions on the same request
//! cannot both win. Slot booking uses `WHERE NOT is_booked` for the same reason.

use chrono::Utc;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    middleware::auth::AuthContext,
    models::{
        notification::{NewNotification, kind},
        schedule_request::{
            CreateScheduleRequest, SCHEDULE_REQUEST_SELECT, ScheduleAction, ScheduleRequestQuery,
            ScheduleRequestResponse, ScheduleRequestRow, ScheduleStatus, Transition,
        },
    },
    pagination::{Page, PageParams},
    services::{catalog_service, notification_service, validation::FieldErrors},
};

const MAX_MESSAGE: usize = 1000;
const MAX_NOTE: usize = 500;

/// Which rows a list call covers.
#[derive(Debug, Clone, Copy)]
pub enum Scope {
    /// Requests the user made
    Requester(Uuid),
    /// Requests for services the user publishes
    Contractor(Uuid),
    /// Every request (admin)
    All,
}

impl Scope {
    fn predicate(&self) -> &'static str {
        match self {
            Scope::Requester(_) => "r.requester_id = $1",
            Scope::Contractor(_) => "s.contractor_id = $1",
            Scope::All => "$1::uuid IS NULL",
        }
    }

    fn bound_id(&self) -> Option<Uuid> {
        match self {
            Scope::Requester(id) | Scope::Contractor(id) => Some(*id),
            Scope::All => None,
        }
    }
}

async fn fetch(pool: &DbPool, request_id: Uuid) -> Result<ScheduleRequestRow, AppError> {
    sqlx::query_as::<_, ScheduleRequestRow>(&format!(
        "{SCHEDULE_REQUEST_SELECT} WHERE r.id = $1"
    ))
    .bind(request_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Schedule request"))
}

/// Partial unique index allowing one PENDING request per requester and service.
const PENDING_UNIQUE_INDEX: &str = "uq_schedule_requests_pending";

fn duplicate_pending() -> AppError {
    AppError::Conflict("You already have a pending request for this service".to_string())
}

/// Create a request for a service.
///
/// # Validation
///
/// - Service must exist and be active, and not belong to the caller
/// - `availability_id`, when given, must be an unbooked future slot of that service
/// - `preferred_date`, when given, must be in the future
/// - The caller may not have another pending request for the same service
pub async fn create(
    pool: &DbPool,
    auth: &AuthContext,
    request: CreateScheduleRequest,
) -> Result<ScheduleRequestResponse, AppError> {
    let mut errors = FieldErrors::default();
    errors.optional_text("message", request.message.as_deref(), MAX_MESSAGE);
    if request.preferred_date.is_some_and(|d| d <= Utc::now()) {
        errors.add("preferred_date", "Preferred date must be in the future");
    }
    errors.into_result()?;

    let service = catalog_service::get(pool, request.service_id, None).await?;
    if service.contractor_id == auth.user_id {
        return Err(AppError::Forbidden(
            "You cannot request your own service".to_string(),
        ));
    }

    if let Some(slot_id) = request.availability_id {
        let slot: Option<(Uuid, bool, bool)> = sqlx::query_as(
            "SELECT service_id, is_booked, ends_at > NOW() FROM availability WHERE id = $1",
        )
        .bind(slot_id)
        .fetch_optional(pool)
        .await?;

        match slot {
            Some((service_id, _, _)) if service_id != service.id => {
                let mut errors = FieldErrors::default();
                errors.add("availability_id", "Slot does not belong to this service");
                return Err(AppError::Validation(errors));
            }
            Some((_, true, _)) => {
                return Err(AppError::Conflict("Slot is already booked".to_string()));
            }
            Some((_, false, false)) => {
                let mut errors = FieldErrors::default();
                errors.add("availability_id", "Slot is in the past");
                return Err(AppError::Validation(errors));
            }
            Some(_) => {}
            None => return Err(AppError::NotFound("Availability")),
        }
    }

    let already_pending: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM schedule_requests
            WHERE service_id = $1 AND requester_id = $2 AND status = 'PENDING'
        )
        "#,
    )
    .bind(service.id)
    .bind(auth.user_id)
    .fetch_one(pool)
    .await?;
    if already_pending {
        return Err(duplicate_pending());
    }

    let mut tx = pool.begin().await?;

    let request_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO schedule_requests (service_id, requester_id, availability_id, preferred_date, message)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(service.id)
    .bind(auth.user_id)
    .bind(request.availability_id)
    .bind(request.preferred_date)
    .bind(request.message.as_deref().map(str::trim))
    .fetch_one(&mut *tx)
    .await
    .map_err(|err| match err.as_database_error().and_then(|db| db.constraint()) {
        // Lost the race against a concurrent create
        Some(PENDING_UNIQUE_INDEX) => duplicate_pending(),
        _ => AppError::from(err),
    })?;

    notification_service::create(
        &mut *tx,
        NewNotification {
            user_id: service.contractor_id,
            kind: kind::SCHEDULE_REQUESTED,
            title: "Nueva solicitud de servicio".to_string(),
            message: format!("Recibiste una solicitud para \"{}\"", service.title),
            related_id: Some(request_id),
        },
    )
    .await?;

    tx.commit().await?;

    tracing::info!(%request_id, service_id = %service.id, requester_id = %auth.user_id, "schedule_request_created");
    Ok(fetch(pool, request_id).await?.into())
}

/// Fetch one request visible to the caller (either party or an admin).
///
/// Requests of other users are reported as not found.
pub async fn get(
    pool: &DbPool,
    auth: &AuthContext,
    request_id: Uuid,
) -> Result<ScheduleRequestResponse, AppError> {
    let row = fetch(pool, request_id).await?;
    let is_party = row.requester_id == auth.user_id || row.contractor_id == auth.user_id;
    if !is_party && !auth.is_admin() {
        return Err(AppError::NotFound("Schedule request"));
    }
    Ok(row.into())
}

/// Paginated requests in `scope`, newest first, optionally filtered by status.
pub async fn list(
    pool: &DbPool,
    scope: Scope,
    query: ScheduleRequestQuery,
) -> Result<Page<ScheduleRequestResponse>, AppError> {
    let pagination = PageParams {
        page: query.page,
        limit: query.limit,
    }
    .normalize();
    let predicate = scope.predicate();

    let total: i64 = sqlx::query_scalar(&format!(
        r#"
        SELECT COUNT(*)
        FROM schedule_requests r
        JOIN services s ON s.id = r.service_id
        WHERE {predicate} AND ($2::schedule_status IS NULL OR r.status = $2)
        "#
    ))
    .bind(scope.bound_id())
    .bind(query.status)
    .fetch_one(pool)
    .await?;

    let rows = sqlx::query_as::<_, ScheduleRequestRow>(&format!(
        r#"
        {SCHEDULE_REQUEST_SELECT}
        WHERE {predicate} AND ($2::schedule_status IS NULL OR r.status = $2)
        ORDER BY r.created_at DESC
        LIMIT $3 OFFSET $4
        "#
    ))
    .bind(scope.bound_id())
    .bind(query.status)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(pool)
    .await?;

    let items = rows.into_iter().map(Into::into).collect();
    Ok(Page::new(items, &pagination, total))
}

/// Locked view of a request used while deciding a transition.
#[derive(Debug, sqlx::FromRow)]
struct LockedRequest {
    status: ScheduleStatus,
    requester_id: Uuid,
    contractor_id: Uuid,
    availability_id: Option<Uuid>,
    service_title: String,
}

/// Check that `auth` may perform `action` on a request.
///
/// Non-parties get `NotFound` so request ids do not leak.
fn authorize(auth: &AuthContext, locked: &LockedRequest, action: ScheduleAction) -> Result<(), AppError> {
    let is_requester = locked.requester_id == auth.user_id;
    let is_contractor = locked.contractor_id == auth.user_id;

    if !is_requester && !is_contractor && !auth.is_admin() {
        return Err(AppError::NotFound("Schedule request"));
    }

    let allowed = match action {
        ScheduleAction::Accept | ScheduleAction::Reject => is_contractor || auth.is_admin(),
        ScheduleAction::Cancel => is_requester,
    };
    if !allowed {
        return Err(AppError::forbidden());
    }
    Ok(())
}

/// Accept, reject or cancel a request.
///
/// # Process
///
/// 1. Lock the request row
/// 2. Check the caller's permission for `action`
/// 3. Check the status transition (re-applying the current status is a no-op)
/// 4. On accept, book the slot if one was chosen
/// 5. Update the row and notify the other party
/// 6. Commit
///
/// # Errors
///
/// - `NotFound`: request does not exist or the caller is not a party
/// - `Forbidden`: caller is a party but may not perform `action`
/// - `InvalidTransition`: request already left `PENDING` for another status
/// - `Conflict`: the chosen slot was booked by another request
pub async fn respond(
    pool: &DbPool,
    auth: &AuthContext,
    request_id: Uuid,
    action: ScheduleAction,
    note: Option<String>,
) -> Result<ScheduleRequestResponse, AppError> {
    let mut errors = FieldErrors::default();
    errors.optional_text("note", note.as_deref(), MAX_NOTE);
    errors.into_result()?;

    let mut tx = pool.begin().await?;

    let locked = sqlx::query_as::<_, LockedRequest>(
        r#"
        SELECT r.status, r.requester_id, s.contractor_id, r.availability_id, s.title AS service_title
        FROM schedule_requests r
        JOIN services s ON s.id = r.service_id
        WHERE r.id = $1
        FOR UPDATE OF r
        "#,
    )
    .bind(request_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound("Schedule request"))?;

    authorize(auth, &locked, action)?;

    let target = action.target();
    if locked.status.transition_to(target)? == Transition::NoOp {
        tx.rollback().await?;
        return Ok(fetch(pool, request_id).await?.into());
    }

    if action == ScheduleAction::Accept {
        if let Some(slot_id) = locked.availability_id {
            book_slot(&mut tx, slot_id).await?;
        }
    }

    sqlx::query(
        r#"
        UPDATE schedule_requests
        SET status = $2, response_note = $3, responded_at = NOW(), updated_at = NOW()
        WHERE id = $1 AND status = 'PENDING'
        "#,
    )
    .bind(request_id)
    .bind(target)
    .bind(note.as_deref().map(str::trim))
    .execute(&mut *tx)
    .await?;

    notification_service::create(&mut *tx, notification_for(&locked, action, request_id)).await?;

    tx.commit().await?;

    tracing::info!(
        %request_id,
        status = target.as_str(),
        by = %auth.user_id,
        "schedule_request_transitioned"
    );
    Ok(fetch(pool, request_id).await?.into())
}

async fn book_slot(tx: &mut Transaction<'_, Postgres>, slot_id: Uuid) -> Result<(), AppError> {
    let booked = sqlx::query("UPDATE availability SET is_booked = true WHERE id = $1 AND NOT is_booked")
        .bind(slot_id)
        .execute(&mut **tx)
        .await?
        .rows_affected();

    if booked == 0 {
        return Err(AppError::Conflict(
            "The selected slot is no longer available".to_string(),
        ));
    }
    Ok(())
}

/// Notification for the party that did not act.
fn notification_for(locked: &LockedRequest, action: ScheduleAction, request_id: Uuid) -> NewNotification {
    let title = &locked.service_title;
    let (user_id, kind, heading, message) = match action {
        ScheduleAction::Accept => (
            locked.requester_id,
            kind::SCHEDULE_ACCEPTED,
            "Solicitud aceptada",
            format!("Tu solicitud para \"{title}\" fue aceptada. Ya podés ver el contacto del contratista."),
        ),
        ScheduleAction::Reject => (
            locked.requester_id,
            kind::SCHEDULE_REJECTED,
            "Solicitud rechazada",
            format!("Tu solicitud para \"{title}\" fue rechazada."),
        ),
        ScheduleAction::Cancel => (
            locked.contractor_id,
            kind::SCHEDULE_CANCELLED,
            "Solicitud cancelada",
            format!("Una solicitud para \"{title}\" fue cancelada."),
        ),
    };

    NewNotification {
        user_id,
        kind,
        title: heading.to_string(),
        message,
        related_id: Some(request_id),
    }
}
