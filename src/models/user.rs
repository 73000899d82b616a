//! User data models and auth request/response types.
//!
//! This module defines:
//! - `Role`: platform roles, stored as the `user_role` Postgres enum
//! - `User`: database entity
//! - Request bodies for registration, login, token refresh and profile updates
//! - `UserResponse`: the user as returned to clients (no password hash)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Platform role of a user.
///
/// `USER` books services, `CONTRACTOR` publishes them, `ADMIN` moderates,
/// `SUPERADMIN` additionally manages roles, settings and security logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[default]
    User,
    Contractor,
    Admin,
    Superadmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Contractor => "CONTRACTOR",
            Role::Admin => "ADMIN",
            Role::Superadmin => "SUPERADMIN",
        }
    }

    /// ADMIN or SUPERADMIN.
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin | Role::Superadmin)
    }

    /// Roles allowed to publish services.
    pub fn can_publish(&self) -> bool {
        matches!(self, Role::Contractor | Role::Admin | Role::Superadmin)
    }

    /// Roles a visitor may pick for themselves during registration.
    pub fn is_self_assignable(&self) -> bool {
        matches!(self, Role::User | Role::Contractor)
    }
}

/// Represents a user record from the database.
///
/// # Database Table
///
/// Maps to the `users` table. `email` is stored trimmed and lowercased and is
/// unique. `password_hash` is an Argon2 PHC string.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub avatar_url: Option<String>,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Column list for `SELECT`/`RETURNING` on `users`.
pub const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, phone, role, \
     avatar_url, is_active, last_login_at, created_at, updated_at";

/// Request body for `POST /api/v1/auth/register`.
///
/// These are the fields collected across the registration wizard's steps.
/// Everything is optional at the serde level so that validation can report
/// all missing fields at once instead of failing on the first.
///
/// # JSON Example
///
/// ```json
/// {
///   "email": "productor@example.com",
///   "password": "Campo2024",
///   "confirm_password": "Campo2024",
///   "first_name": "Ana",
///   "last_name": "Pereira",
///   "phone": "+598 99 123 456",
///   "role": "CONTRACTOR",
///   "accept_terms": true
/// }
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub accept_terms: bool,
}

/// Request body for `POST /api/v1/auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for `POST /api/v1/auth/refresh` and `POST /api/v1/auth/logout`.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Request body for `PUT /api/v1/users/me`. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
}

/// User as returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub avatar_url: Option<String>,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Removes the password hash.
impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            phone: user.phone,
            role: user.role,
            avatar_url: user.avatar_url,
            is_active: user.is_active,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
        }
    }
}

/// Tokens plus the authenticated user, returned by register, login and refresh.
///
/// ```json
/// {
///   "user": { "id": "...", "email": "...", "role": "USER", ... },
///   "access_token": "eyJhbGciOi...",
///   "refresh_token": "9f86d081884c7d65...",
///   "token_type": "Bearer",
///   "expires_in": 900
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Query parameters for the admin user list.
#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub role: Option<Role>,
    pub search: Option<String>,
}

/// Request body for `PUT /api/v1/admin/users/{id}/role`.
#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: Role,
}

/// Request body for `PUT /api/v1/admin/users/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    pub is_active: bool,
}
