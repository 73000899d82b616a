//! AgroRedUy API: a marketplace connecting agricultural service contractors
//! with producers in Uruguay.
//!
//! The server binary (`src/main.rs`) and the `seed` binary share everything
//! through this library.

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod response;
pub mod seed;
pub mod services;
pub mod state;
