//! Admin dashboard statistics.
//!
//! Everything is aggregated in SQL; the dashboard receives ready-to-plot
//! series instead of raw rows.

use crate::{
    db::DbPool,
    error::AppError,
    models::{
        analytics::{
            CategoryCount, DashboardStats, MonthlyCount, RoleCount, StatusCount, Totals,
            TopService,
        },
        schedule_request::ScheduleStatus,
    },
};

const TOP_SERVICES: i64 = 5;

/// `accepted / (accepted + rejected)`, or `None` when nothing was decided yet.
pub fn acceptance_rate(requests_by_status: &[StatusCount]) -> Option<f64> {
    let count_of = |status: ScheduleStatus| {
        requests_by_status
            .iter()
            .find(|c| c.status == status)
            .map_or(0, |c| c.count)
    };
    let accepted = count_of(ScheduleStatus::Accepted);
    let decided = accepted + count_of(ScheduleStatus::Rejected);

    (decided > 0).then(|| accepted as f64 / decided as f64)
}

pub async fn dashboard(pool: &DbPool) -> Result<DashboardStats, AppError> {
    let (users, active_services, categories, schedule_requests, open_reports): (
        i64,
        i64,
        i64,
        i64,
        i64,
    ) = sqlx::query_as(
        r#"
        SELECT
            (SELECT COUNT(*) FROM users),
            (SELECT COUNT(*) FROM services WHERE is_active),
            (SELECT COUNT(*) FROM categories WHERE is_active),
            (SELECT COUNT(*) FROM schedule_requests),
            (SELECT COUNT(*) FROM reports WHERE status = 'OPEN')
        "#,
    )
    .fetch_one(pool)
    .await?;

    let users_by_role = sqlx::query_as::<_, RoleCount>(
        "SELECT role, COUNT(*) AS count FROM users GROUP BY role ORDER BY role",
    )
    .fetch_all(pool)
    .await?;

    let requests_by_status = sqlx::query_as::<_, StatusCount>(
        "SELECT status, COUNT(*) AS count FROM schedule_requests GROUP BY status ORDER BY status",
    )
    .fetch_all(pool)
    .await?;

    let services_by_category = sqlx::query_as::<_, CategoryCount>(
        r#"
        SELECT c.id AS category_id, c.name, COUNT(s.id) FILTER (WHERE s.is_active) AS count
        FROM categories c
        LEFT JOIN services s ON s.category_id = c.id
        GROUP BY c.id
        ORDER BY count DESC, c.name
        "#,
    )
    .fetch_all(pool)
    .await?;

    // Zero-filled so the chart always has 12 points
    let requests_per_month = sqlx::query_as::<_, MonthlyCount>(
        r#"
        SELECT m.month, COUNT(r.id) AS count
        FROM generate_series(
            date_trunc('month', NOW()) - INTERVAL '11 months',
            date_trunc('month', NOW()),
            INTERVAL '1 month'
        ) AS m(month)
        LEFT JOIN schedule_requests r ON date_trunc('month', r.created_at) = m.month
        GROUP BY m.month
        ORDER BY m.month
        "#,
    )
    .fetch_all(pool)
    .await?;

    let top_services = sqlx::query_as::<_, TopService>(
        r#"
        SELECT s.id AS service_id, s.title, COUNT(r.id) AS request_count
        FROM services s
        JOIN schedule_requests r ON r.service_id = s.id
        GROUP BY s.id
        ORDER BY request_count DESC, s.title
        LIMIT $1
        "#,
    )
    .bind(TOP_SERVICES)
    .fetch_all(pool)
    .await?;

    Ok(DashboardStats {
        totals: Totals {
            users,
            active_services,
            categories,
            schedule_requests,
            open_reports,
        },
        acceptance_rate: acceptance_rate(&requests_by_status),
        users_by_role,
        requests_by_status,
        services_by_category,
        requests_per_month,
        top_services,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(pairs: &[(ScheduleStatus, i64)]) -> Vec<StatusCount> {
        pairs
            .iter()
            .map(|&(status, count)| StatusCount { status, count })
            .collect()
    }

    #[test]
    fn rate_ignores_pending_and_cancelled() {
        let stats = counts(&[
            (ScheduleStatus::Pending, 10),
            (ScheduleStatus::Accepted, 3),
            (ScheduleStatus::Rejected, 1),
            (ScheduleStatus::Cancelled, 7),
        ]);
        assert_eq!(acceptance_rate(&stats), Some(0.75));
    }

    #[test]
    fn rate_is_none_without_decisions() {
        assert_eq!(acceptance_rate(&[]), None);
        assert_eq!(
            acceptance_rate(&counts(&[(ScheduleStatus::Pending, 4)])),
            None
        );
    }
}
