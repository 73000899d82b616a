//! AgroRedUy API server.
//!
//! Contractors publish agricultural services, producers browse them and send
//! schedule requests, admins moderate the platform.
//!
//! # Startup Flow
//!
//! 1. Load configuration from the environment (`.env` is optional)
//! 2. Connect to PostgreSQL and apply pending migrations
//! 3. Make sure the upload directory exists
//! 4. Serve the router until Ctrl+C or SIGTERM

use agrored::{app, config::Config, db, state::AppState};
use tokio::{net::TcpListener, signal};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG controls verbosity, "info" when unset
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        port = config.server_port,
        upload_dir = %config.upload_dir,
        "configuration loaded"
    );

    let pool = db::create_pool(&config.database_url, config.db_max_connections).await?;
    db::run_migrations(&pool).await?;
    tracing::info!("database ready");

    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let address = format!("0.0.0.0:{}", config.server_port);
    let router = app::build_router(AppState::new(pool, config));

    let listener = TcpListener::bind(&address).await?;
    tracing::info!(%address, "AgroRedUy API listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => tracing::info!("received Ctrl+C, shutting down"),
            Err(error) => {
                tracing::error!(%error, "cannot listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                tracing::info!("received SIGTERM, shutting down");
            }
            Err(error) => {
                tracing::error!(%error, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
