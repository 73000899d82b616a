//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, etc.)
//! 2. Delegates to a service function
//! 3. Returns the response envelope (or an `AppError`)

/// Admin panel endpoints
pub mod admin;
/// Registration, login, token refresh and profile
pub mod auth;
/// Categories, services and availability slots
pub mod catalog;
/// FAQ, content pages and reports
pub mod content;
/// Image uploads
pub mod files;
/// Health check
pub mod health;
/// In-app notifications
pub mod notifications;
/// OAuth provider status and redirects
pub mod oauth;
/// Booking workflow
pub mod schedule_requests;
