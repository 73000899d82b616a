//! Schedule request models and the request status machine.
//!
//! A schedule request is a user's ask to reserve a service. It starts as
//! `PENDING`; the contractor (or an admin) accepts or rejects it, the
//! requester may cancel it. Every state other than `PENDING` is terminal.
//!
//! ```text
//!            accept            reject
//! ACCEPTED <-------- PENDING --------> REJECTED
//!                       |
//!                       | cancel
//!                       v
//!                   CANCELLED
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Status of a schedule request, stored as the `schedule_status` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "schedule_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
}

/// Outcome of checking a requested status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Row must be updated from `PENDING` to the target.
    Apply,
    /// Row already has the target status; nothing to write.
    NoOp,
}

impl ScheduleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleStatus::Pending => "PENDING",
            ScheduleStatus::Accepted => "ACCEPTED",
            ScheduleStatus::Rejected => "REJECTED",
            ScheduleStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ScheduleStatus::Pending)
    }

    /// Contact details of the counterpart are only shown once accepted.
    pub fn reveals_contact(&self) -> bool {
        matches!(self, ScheduleStatus::Accepted)
    }

    /// Check a move from `self` to `target`.
    ///
    /// Re-applying the current status is idempotent. Leaving a terminal
    /// status, or moving back to `PENDING`, is rejected.
    pub fn transition_to(self, target: ScheduleStatus) -> Result<Transition, AppError> {
        if self == target {
            return Ok(Transition::NoOp);
        }
        if self == ScheduleStatus::Pending && target.is_terminal() {
            return Ok(Transition::Apply);
        }
        Err(AppError::InvalidTransition {
            from: self.as_str().to_string(),
            to: target.as_str().to_string(),
        })
    }
}

/// What a caller asks to do with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleAction {
    Accept,
    Reject,
    Cancel,
}

impl ScheduleAction {
    pub fn target(&self) -> ScheduleStatus {
        match self {
            ScheduleAction::Accept => ScheduleStatus::Accepted,
            ScheduleAction::Reject => ScheduleStatus::Rejected,
            ScheduleAction::Cancel => ScheduleStatus::Cancelled,
        }
    }
}

/// Schedule request joined with the service and both parties.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScheduleRequestRow {
    pub id: Uuid,
    pub service_id: Uuid,
    pub service_title: String,
    pub contractor_id: Uuid,
    pub contractor_name: String,
    pub contractor_phone: Option<String>,
    pub contractor_email: String,
    pub requester_id: Uuid,
    pub requester_name: String,
    pub requester_phone: Option<String>,
    pub requester_email: String,
    pub availability_id: Option<Uuid>,
    pub slot_starts_at: Option<DateTime<Utc>>,
    pub slot_ends_at: Option<DateTime<Utc>>,
    pub preferred_date: Option<DateTime<Utc>>,
    pub message: Option<String>,
    pub status: ScheduleStatus,
    pub response_note: Option<String>,
    pub responded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `SELECT` clause producing [`ScheduleRequestRow`]s; append `WHERE ...` to it.
pub const SCHEDULE_REQUEST_SELECT: &str = r#"
    SELECT r.id, r.service_id, s.title AS service_title,
           s.contractor_id, c.first_name || ' ' || c.last_name AS contractor_name,
           c.phone AS contractor_phone, c.email AS contractor_email,
           r.requester_id, q.first_name || ' ' || q.last_name AS requester_name,
           q.phone AS requester_phone, q.email AS requester_email,
           r.availability_id, a.starts_at AS slot_starts_at, a.ends_at AS slot_ends_at,
           r.preferred_date, r.message, r.status, r.response_note, r.responded_at,
           r.created_at, r.updated_at
    FROM schedule_requests r
    JOIN services s ON s.id = r.service_id
    JOIN users c ON c.id = s.contractor_id
    JOIN users q ON q.id = r.requester_id
    LEFT JOIN availability a ON a.id = r.availability_id
"#;

/// One side of a schedule request.
///
/// `phone` and `email` stay `None` until the request is accepted.
#[derive(Debug, Clone, Serialize)]
pub struct Party {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Reserved slot of a request, when one was chosen.
#[derive(Debug, Clone, Serialize)]
pub struct Slot {
    pub id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

/// Schedule request as returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleRequestResponse {
    pub id: Uuid,
    pub service_id: Uuid,
    pub service_title: String,
    pub contractor: Party,
    pub requester: Party,
    pub slot: Option<Slot>,
    pub preferred_date: Option<DateTime<Utc>>,
    pub message: Option<String>,
    pub status: ScheduleStatus,
    pub response_note: Option<String>,
    pub responded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ScheduleRequestRow> for ScheduleRequestResponse {
    fn from(row: ScheduleRequestRow) -> Self {
        let visible = row.status.reveals_contact();

        let slot = match (row.availability_id, row.slot_starts_at, row.slot_ends_at) {
            (Some(id), Some(starts_at), Some(ends_at)) => Some(Slot {
                id,
                starts_at,
                ends_at,
            }),
            _ => None,
        };

        Self {
            id: row.id,
            service_id: row.service_id,
            service_title: row.service_title,
            contractor: Party {
                id: row.contractor_id,
                name: row.contractor_name,
                phone: row.contractor_phone.filter(|_| visible),
                email: visible.then_some(row.contractor_email),
            },
            requester: Party {
                id: row.requester_id,
                name: row.requester_name,
                phone: row.requester_phone.filter(|_| visible),
                email: visible.then_some(row.requester_email),
            },
            slot,
            preferred_date: row.preferred_date,
            message: row.message,
            status: row.status,
            response_note: row.response_note,
            responded_at: row.responded_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Request body for `POST /api/v1/schedule-requests`.
///
/// ```json
/// {
///   "service_id": "550e8400-e29b-41d4-a716-446655440000",
///   "availability_id": "660e8400-e29b-41d4-a716-446655440001",
///   "message": "Son 120 hectáreas cerca de Young"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct CreateScheduleRequest {
    pub service_id: Uuid,
    pub availability_id: Option<Uuid>,
    pub preferred_date: Option<DateTime<Utc>>,
    pub message: Option<String>,
}

/// Optional note attached to accept / reject / cancel.
#[derive(Debug, Default, Deserialize)]
pub struct RespondRequest {
    pub note: Option<String>,
}

/// Query parameters for schedule request lists.
#[derive(Debug, Default, Deserialize)]
pub struct ScheduleRequestQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<ScheduleStatus>,
}
