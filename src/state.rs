//! Shared application state handed to every handler.

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{config::Config, db::DbPool};

/// Database pool plus configuration.
///
/// Handlers that only need the pool keep extracting `State<DbPool>`; the
/// `FromRef` impls below pull each part out of the combined state.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(pool: DbPool, config: Config) -> Self {
        Self {
            pool,
            config: Arc::new(config),
        }
    }
}

impl FromRef<AppState> for DbPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Arc<Config> {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
