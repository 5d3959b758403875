use std::sync::Arc;

use shared::{Config, DispatchCoordinator, IngestionCoordinator, SignalStore};

/// Shared application state for axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub ingestion: Arc<IngestionCoordinator>,
    pub dispatch: Arc<DispatchCoordinator>,
    pub store: Arc<dyn SignalStore>,
    pub webhook_secret: Option<String>,
    pub signal_secret: Option<String>,
}

impl AppState {
    pub fn from_config(store: Arc<dyn SignalStore>, config: &Config) -> anyhow::Result<Self> {
        let mapper = Arc::new(config.symbol_map()?);
        let ingestion = IngestionCoordinator::new(store.clone(), mapper)
            .with_store_timeout(config.store_timeout());
        let dispatch = DispatchCoordinator::new(store.clone())
            .with_retry_budget(config.claim_retry_budget)
            .with_default_claimant(config.default_claimant.clone())
            .with_store_timeout(config.store_timeout());

        Ok(Self {
            ingestion: Arc::new(ingestion),
            dispatch: Arc::new(dispatch),
            store,
            webhook_secret: config.webhook_secret.clone(),
            signal_secret: config.signal_secret.clone(),
        })
    }
}
