//! HTTP middleware components.
//!
//! Middleware are functions that run before route handlers.
//! They can:
//! - Authenticate requests
//! - Attach caller information
//! - Short-circuit requests (reject unauthorized)

/// Bearer token authentication middleware
pub mod auth;
/// Client IP extraction for audit logs
pub mod client_ip;
