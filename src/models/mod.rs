//! Data models representing database entities.
//!
//! This module contains all data structures that map to database tables,
//! plus the request and response bodies built from them.

/// Dashboard aggregates
pub mod analytics;
/// Availability slots of a service
pub mod availability;
/// Service categories
pub mod category;
/// FAQ and static pages
pub mod content;
/// In-app notifications
pub mod notification;
/// Refresh token records
pub mod refresh_token;
/// Abuse reports
pub mod report;
/// Schedule requests and their status machine
pub mod schedule_request;
/// Security audit log
pub mod security_log;
/// Service listings
pub mod service;
/// Platform settings
pub mod setting;
/// Users and auth bodies
pub mod user;
