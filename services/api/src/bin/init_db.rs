//! services/api/src/bin/init_db.rs
//!
//! One-shot schema creation. Opens its own connection to `DATABASE_URL`,
//! creates the `rounds` and `attempts` tables with their indexes, and closes
//! the connection. Fails if the tables already exist.

use api_lib::{
    adapters::{db, DbAdapter},
    config::Config,
    error::ApiError,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Initializing database at {}", config.database_url);
    let pool = db::connect(&config.database_url, true).await?;
    let db_adapter = DbAdapter::new(pool);

    let created = db_adapter.create_schema().await;
    db_adapter.close().await;
    created?;

    info!("Database initialized successfully");
    Ok(())
}
