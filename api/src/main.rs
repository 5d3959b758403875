use anyhow::Result;
use migration::{Migrator, MigratorTrait};
use shared::{
    get_db_connection, init_tracing, Config, MemorySignalStore, SeaOrmSignalStore, SignalStore,
};
use std::sync::Arc;
use tracing::{info, warn};

mod handlers;
mod routes;
mod state;

use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    info!("Starting signal relay API server...");

    let config = Config::from_env()?;
    let store = open_store(&config).await?;

    if config.webhook_secret.is_none() {
        warn!("WEBHOOK_SECRET is not set, /api/telegram will refuse every update");
    }
    if config.signal_secret.is_none() {
        warn!("SIGNAL_SECRET is not set, terminal endpoints will refuse every poll");
    }

    let state = AppState::from_config(store, &config)?;
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("API server listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API server stopped");
    Ok(())
}

async fn open_store(config: &Config) -> Result<Arc<dyn SignalStore>> {
    if config.uses_memory_store() {
        warn!("DATABASE_URL=memory, signals will not survive a restart");
        return Ok(Arc::new(MemorySignalStore::new()));
    }

    let db = get_db_connection(&config.database_url, config.store_timeout()).await?;
    info!("Connected to database");

    if config.run_migrations {
        Migrator::up(&db, None).await?;
        info!("Database migrations applied");
    }

    Ok(Arc::new(SeaOrmSignalStore::new(Arc::new(db))))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
