pub mod aliases;
pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod logging;
pub mod models;
pub mod parser;
pub mod repositories;
pub mod services;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use aliases::{SymbolMapper, StaticSymbolMap};
pub use config::Config;
pub use database::{get_db_connection, DbConnection};
pub use error::{DispatchError, IngestError, StoreError};
pub use logging::init_tracing;
pub use models::*;
pub use repositories::{MemorySignalStore, SeaOrmSignalStore};
pub use services::{
    ClaimedSignal, DispatchCoordinator, DispatchOutcome, DispatchRequest, IncomingAlert,
    IngestOutcome, IngestionCoordinator, SkipReason,
};
pub use store::{ClaimAttempt, SignalStore};
