//! Seed the database with categories, the superadmin account, default
//! settings and static content.
//!
//! ```text
//! SUPERADMIN_EMAIL=admin@agrored.uy SUPERADMIN_PASSWORD=... cargo run --bin seed
//! ```
//!
//! Set `SEED_SAMPLE_DATA=true` to also create demo listings.

use agrored::{config::Config, db, seed};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    let pool = db::create_pool(&config.database_url, config.db_max_connections).await?;
    db::run_migrations(&pool).await?;

    let summary = seed::run(&pool, &config).await?;
    tracing::info!(
        categories = summary.categories,
        superadmin_created = summary.superadmin_created,
        settings = summary.settings,
        pages = summary.pages,
        faqs = summary.faqs,
        sample_services = summary.sample_services,
        "seed complete"
    );

    Ok(())
}
