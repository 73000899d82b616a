//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! They handle database transactions, validation, and complex operations.

pub mod analytics_service;
pub mod auth_service;
pub mod availability_service;
pub mod catalog_service;
pub mod category_service;
pub mod content_service;
pub mod notification_service;
pub mod oauth_service;
pub mod report_service;
pub mod schedule_service;
pub mod security_log_service;
pub mod settings_service;
pub mod tokens;
pub mod upload_service;
pub mod user_admin_service;
pub mod validation;
