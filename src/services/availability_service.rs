//! Availability slots of a service.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    middleware::auth::AuthContext,
    models::availability::{Availability, CreateAvailabilityRequest},
    services::{catalog_service, validation::FieldErrors},
};

const AVAILABILITY_COLUMNS: &str = "id, service_id, starts_at, ends_at, is_booked, created_at";

/// Upcoming slots (not yet ended) of a service, earliest first.
///
/// Slots of an inactive service are only listed to its owner and admins.
pub async fn list_upcoming(
    pool: &DbPool,
    service_id: Uuid,
    viewer: Option<&AuthContext>,
) -> Result<Vec<Availability>, AppError> {
    catalog_service::get(pool, service_id, viewer).await?;

    let slots = sqlx::query_as::<_, Availability>(&format!(
        r#"
        SELECT {AVAILABILITY_COLUMNS}
        FROM availability
        WHERE service_id = $1 AND ends_at > NOW()
        ORDER BY starts_at
        "#
    ))
    .bind(service_id)
    .fetch_all(pool)
    .await?;
    Ok(slots)
}

fn validate_window(
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    let mut errors = FieldErrors::default();
    if starts_at <= now {
        errors.add("starts_at", "Start must be in the future");
    }
    if ends_at <= starts_at {
        errors.add("ends_at", "End must be after start");
    }
    errors.into_result()
}

/// Add a slot to a service the caller owns (or administers).
///
/// # Errors
///
/// - `Validation`: start in the past or end before start
/// - `Conflict`: overlaps an existing slot of the same service
pub async fn create(
    pool: &DbPool,
    auth: &AuthContext,
    service_id: Uuid,
    request: CreateAvailabilityRequest,
) -> Result<Availability, AppError> {
    catalog_service::get_owned(pool, service_id, auth).await?;
    validate_window(request.starts_at, request.ends_at, Utc::now())?;

    let mut tx = pool.begin().await?;

    // Serialize slot creation per service so the overlap check holds
    sqlx::query("SELECT id FROM services WHERE id = $1 FOR UPDATE")
        .bind(service_id)
        .execute(&mut *tx)
        .await?;

    let overlaps: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM availability
            WHERE service_id = $1 AND starts_at < $3 AND ends_at > $2
        )
        "#,
    )
    .bind(service_id)
    .bind(request.starts_at)
    .bind(request.ends_at)
    .fetch_one(&mut *tx)
    .await?;

    if overlaps {
        tx.rollback().await?;
        return Err(AppError::Conflict(
            "Slot overlaps an existing availability window".to_string(),
        ));
    }

    let slot = sqlx::query_as::<_, Availability>(&format!(
        r#"
        INSERT INTO availability (service_id, starts_at, ends_at)
        VALUES ($1, $2, $3)
        RETURNING {AVAILABILITY_COLUMNS}
        "#
    ))
    .bind(service_id)
    .bind(request.starts_at)
    .bind(request.ends_at)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(slot)
}

/// Remove an unbooked slot.
pub async fn delete(pool: &DbPool, auth: &AuthContext, slot_id: Uuid) -> Result<(), AppError> {
    let slot = sqlx::query_as::<_, Availability>(&format!(
        "SELECT {AVAILABILITY_COLUMNS} FROM availability WHERE id = $1"
    ))
    .bind(slot_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Availability"))?;

    catalog_service::get_owned(pool, slot.service_id, auth).await?;

    let result = sqlx::query("DELETE FROM availability WHERE id = $1 AND NOT is_booked")
        .bind(slot_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::Conflict(
            "Booked slots cannot be deleted".to_string(),
        ));
    }
    Ok(())
}
