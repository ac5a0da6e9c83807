use std::sync::Arc;

use anyhow::Result;
use common::database::{health_check, init_pool};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use users::{
    config::AppConfig, repositories::UserRequestRepository, server,
    service::PgUserRequestService,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;

    // Initialize logging; RUST_LOG takes precedence over the debug flag
    let default_level = if config.project.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting {} service", config.project.name);

    // Initialize database connection pool
    let pool = init_pool(&config.database).await?;

    // Check database connectivity
    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    let repository = UserRequestRepository::new(pool.clone());
    let service = Arc::new(PgUserRequestService::new(pool.clone(), repository));

    server::run(&config, service, pool).await
}
