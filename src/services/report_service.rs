//! Abuse reports against services or users.

use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    middleware::auth::AuthContext,
    models::report::{CreateReportRequest, Report, ReportQuery, ReportStatus, ResolveReportRequest},
    pagination::{Page, PageParams},
    services::validation::FieldErrors,
};

const MAX_REASON: usize = 100;
const MAX_DETAILS: usize = 2000;
const MAX_NOTE: usize = 1000;

const REPORT_COLUMNS: &str = "id, reporter_id, service_id, reported_user_id, reason, details, \
     status, resolution_note, resolved_by, resolved_at, created_at";

fn validate(auth: &AuthContext, request: &CreateReportRequest) -> Result<(), AppError> {
    let mut errors = FieldErrors::default();
    errors.require_text("reason", &request.reason, MAX_REASON);
    errors.optional_text("details", request.details.as_deref(), MAX_DETAILS);

    match (request.service_id, request.reported_user_id) {
        (Some(_), Some(_)) | (None, None) => {
            errors.add("target", "Report exactly one of service_id or reported_user_id");
        }
        (None, Some(user_id)) if user_id == auth.user_id => {
            errors.add("reported_user_id", "You cannot report yourself");
        }
        _ => {}
    }
    errors.into_result()
}

/// File a report; the target must exist.
pub async fn create(
    pool: &DbPool,
    auth: &AuthContext,
    request: CreateReportRequest,
) -> Result<Report, AppError> {
    validate(auth, &request)?;

    if let Some(service_id) = request.service_id {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM services WHERE id = $1)")
            .bind(service_id)
            .fetch_one(pool)
            .await?;
        if !exists {
            return Err(AppError::NotFound("Service"));
        }
    }
    if let Some(user_id) = request.reported_user_id {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(pool)
            .await?;
        if !exists {
            return Err(AppError::NotFound("User"));
        }
    }

    let report = sqlx::query_as::<_, Report>(&format!(
        r#"
        INSERT INTO reports (reporter_id, service_id, reported_user_id, reason, details)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {REPORT_COLUMNS}
        "#
    ))
    .bind(auth.user_id)
    .bind(request.service_id)
    .bind(request.reported_user_id)
    .bind(request.reason.trim())
    .bind(request.details.as_deref().map(str::trim))
    .fetch_one(pool)
    .await?;

    tracing::info!(report_id = %report.id, reporter_id = %auth.user_id, "report_created");
    Ok(report)
}

/// Admin list, newest first.
pub async fn list(pool: &DbPool, query: ReportQuery) -> Result<Page<Report>, AppError> {
    let pagination = PageParams {
        page: query.page,
        limit: query.limit,
    }
    .normalize();

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM reports WHERE ($1::report_status IS NULL OR status = $1)",
    )
    .bind(query.status)
    .fetch_one(pool)
    .await?;

    let items = sqlx::query_as::<_, Report>(&format!(
        r#"
        SELECT {REPORT_COLUMNS}
        FROM reports
        WHERE ($1::report_status IS NULL OR status = $1)
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#
    ))
    .bind(query.status)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(pool)
    .await?;

    Ok(Page::new(items, &pagination, total))
}

/// Close an open report as resolved or dismissed.
///
/// # Errors
///
/// - `Validation`: target status is `OPEN` or the note is too long
/// - `NotFound`: no such report
/// - `InvalidTransition`: the report was already closed
pub async fn resolve(
    pool: &DbPool,
    auth: &AuthContext,
    report_id: Uuid,
    request: ResolveReportRequest,
) -> Result<Report, AppError> {
    let mut errors = FieldErrors::default();
    if request.status == ReportStatus::Open {
        errors.add("status", "Status must be RESOLVED or DISMISSED");
    }
    errors.optional_text("note", request.note.as_deref(), MAX_NOTE);
    errors.into_result()?;

    let updated = sqlx::query_as::<_, Report>(&format!(
        r#"
        UPDATE reports
        SET status = $2, resolution_note = $3, resolved_by = $4, resolved_at = NOW()
        WHERE id = $1 AND status = 'OPEN'
        RETURNING {REPORT_COLUMNS}
        "#
    ))
    .bind(report_id)
    .bind(request.status)
    .bind(request.note.as_deref().map(str::trim))
    .bind(auth.user_id)
    .fetch_optional(pool)
    .await?;

    if let Some(report) = updated {
        tracing::info!(%report_id, status = report.status.as_str(), by = %auth.user_id, "report_closed");
        return Ok(report);
    }

    // Nothing updated: either missing or already closed
    let current: Option<ReportStatus> = sqlx::query_scalar("SELECT status FROM reports WHERE id = $1")
        .bind(report_id)
        .fetch_optional(pool)
        .await?;

    match current {
        Some(status) => Err(AppError::InvalidTransition {
            from: status.as_str().to_string(),
            to: request.status.as_str().to_string(),
        }),
        None => Err(AppError::NotFound("Report")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;

    fn auth() -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            role: Role::User,
        }
    }

    fn request(service_id: Option<Uuid>, reported_user_id: Option<Uuid>) -> CreateReportRequest {
        CreateReportRequest {
            service_id,
            reported_user_id,
            reason: "Publicación engañosa".into(),
            details: None,
        }
    }

    #[test]
    fn exactly_one_target() {
        let caller = auth();
        assert!(validate(&caller, &request(Some(Uuid::new_v4()), None)).is_ok());
        assert!(validate(&caller, &request(None, Some(Uuid::new_v4()))).is_ok());

        for bad in [request(None, None), request(Some(Uuid::new_v4()), Some(Uuid::new_v4()))] {
            match validate(&caller, &bad) {
                Err(AppError::Validation(fields)) => assert!(fields.contains("target")),
                other => panic!("expected validation error, got {other:?}"),
            }
        }
    }

    #[test]
    fn cannot_report_self() {
        let caller = auth();
        assert!(validate(&caller, &request(None, Some(caller.user_id))).is_err());
    }

    #[test]
    fn reason_length_is_bounded() {
        let caller = auth();
        let mut req = request(Some(Uuid::new_v4()), None);
        req.reason = "x".repeat(MAX_REASON + 1);
        assert!(validate(&caller, &req).is_err());
    }
}
