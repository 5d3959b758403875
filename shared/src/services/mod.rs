pub mod dispatch;
pub mod ingestion;

pub use dispatch::{ClaimedSignal, DispatchCoordinator, DispatchOutcome, DispatchRequest};
pub use ingestion::{
    ExitObserver, IncomingAlert, IngestOutcome, IngestionCoordinator, LogExitObserver, SkipReason,
};

use std::future::Future;
use std::time::Duration;

use crate::error::StoreError;

/// Default bound on a single store call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_millis(5000);

/// Runs one store call under `limit`. An elapsed call may or may not have
/// committed; callers re-read by id when that matters.
pub(crate) async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or(Err(StoreError::Timeout(limit)))
}
