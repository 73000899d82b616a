//! User administration: listing, role changes and account status.

use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    middleware::auth::AuthContext,
    models::{
        security_log::SecurityEvent,
        user::{Role, USER_COLUMNS, User, UserListQuery, UserResponse},
    },
    pagination::{Page, PageParams},
    services::{auth_service, catalog_service::escape_like, security_log_service},
};

/// Paginated users, newest first, filtered by role and a name/email search.
pub async fn list(pool: &DbPool, query: UserListQuery) -> Result<Page<UserResponse>, AppError> {
    let pagination = PageParams {
        page: query.page,
        limit: query.limit,
    }
    .normalize();
    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", escape_like(s)));

    let filter = r#"
        ($1::user_role IS NULL OR role = $1)
        AND ($2::text IS NULL
             OR email ILIKE $2
             OR first_name ILIKE $2
             OR last_name ILIKE $2
             OR (first_name || ' ' || last_name) ILIKE $2)
    "#;

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM users WHERE {filter}"))
        .bind(query.role)
        .bind(&search)
        .fetch_one(pool)
        .await?;

    let users = sqlx::query_as::<_, User>(&format!(
        r#"
        SELECT {USER_COLUMNS} FROM users
        WHERE {filter}
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#
    ))
    .bind(query.role)
    .bind(&search)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(pool)
    .await?;

    let items = users.into_iter().map(UserResponse::from).collect();
    Ok(Page::new(items, &pagination, total))
}

fn check_role_change(actor: &AuthContext, target_id: Uuid, role: Role) -> Result<(), AppError> {
    actor.require_superadmin()?;
    if actor.user_id == target_id {
        return Err(AppError::Forbidden("You cannot change your own role".to_string()));
    }
    if role == Role::Superadmin {
        return Err(AppError::Forbidden("SUPERADMIN cannot be granted".to_string()));
    }
    Ok(())
}

/// Change a user's role (SUPERADMIN only).
///
/// The auth middleware re-reads the role on every request, so the change is
/// effective immediately.
pub async fn change_role(
    pool: &DbPool,
    actor: &AuthContext,
    target_id: Uuid,
    role: Role,
    ip: Option<&str>,
) -> Result<UserResponse, AppError> {
    check_role_change(actor, target_id, role)?;

    let previous = auth_service::find_user(pool, target_id).await?;
    if previous.role == Role::Superadmin {
        return Err(AppError::Forbidden(
            "SUPERADMIN accounts cannot be changed".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    let user = sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET role = $2, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
    ))
    .bind(target_id)
    .bind(role)
    .fetch_one(&mut *tx)
    .await?;

    security_log_service::record(
        &mut *tx,
        SecurityEvent::RoleChanged,
        Some(target_id),
        ip,
        Some(serde_json::json!({
            "by": actor.user_id,
            "from": previous.role.as_str(),
            "to": role.as_str(),
        })),
    )
    .await?;

    tx.commit().await?;
    Ok(user.into())
}

fn check_status_change(actor: &AuthContext, target_id: Uuid) -> Result<(), AppError> {
    actor.require_admin()?;
    if actor.user_id == target_id {
        return Err(AppError::Forbidden(
            "You cannot change your own account status".to_string(),
        ));
    }
    Ok(())
}

/// Activate or deactivate an account (admin). Deactivation revokes every
/// refresh token of the user in the same transaction as the status change.
pub async fn set_status(
    pool: &DbPool,
    actor: &AuthContext,
    target_id: Uuid,
    is_active: bool,
    ip: Option<&str>,
) -> Result<UserResponse, AppError> {
    check_status_change(actor, target_id)?;

    let target = auth_service::find_user(pool, target_id).await?;
    if target.role == Role::Superadmin {
        return Err(AppError::Forbidden(
            "SUPERADMIN accounts cannot be deactivated".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    let user = sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET is_active = $2, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
    ))
    .bind(target_id)
    .bind(is_active)
    .fetch_one(&mut *tx)
    .await?;

    let (event, revoked) = if is_active {
        (SecurityEvent::UserActivated, 0)
    } else {
        let revoked = auth_service::revoke_all_for_user(&mut *tx, target_id).await?;
        (SecurityEvent::UserDeactivated, revoked)
    };

    security_log_service::record(
        &mut *tx,
        event,
        Some(target_id),
        ip,
        Some(serde_json::json!({ "by": actor.user_id })),
    )
    .await?;

    tx.commit().await?;

    tracing::info!(user_id = %target_id, is_active, revoked, "user_status_changed");
    Ok(user.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(role: Role) -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            role,
        }
    }

    #[test]
    fn only_superadmin_changes_roles() {
        let target = Uuid::new_v4();
        assert!(check_role_change(&ctx(Role::Admin), target, Role::Contractor).is_err());
        assert!(check_role_change(&ctx(Role::Superadmin), target, Role::Admin).is_ok());
    }

    #[test]
    fn role_change_limits() {
        let actor = ctx(Role::Superadmin);
        assert!(check_role_change(&actor, actor.user_id, Role::User).is_err());
        assert!(check_role_change(&actor, Uuid::new_v4(), Role::Superadmin).is_err());
    }

    #[test]
    fn status_change_limits() {
        let admin = ctx(Role::Admin);
        assert!(check_status_change(&admin, Uuid::new_v4()).is_ok());
        assert!(check_status_change(&admin, admin.user_id).is_err());
        assert!(check_status_change(&ctx(Role::Contractor), Uuid::new_v4()).is_err());
    }
}
