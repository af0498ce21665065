//! Applies the per-call store timeout and tags failures with the operation name.

use std::future::Future;
use std::time::Duration;

use crate::error::{CatalogError, CatalogResult};
use crate::ports::PortResult;

/// Default bound for a single store call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) async fn bounded<T, F>(op: &'static str, limit: Duration, call: F) -> CatalogResult<T>
where
    F: Future<Output = PortResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(CatalogError::from_port(op, err)),
        Err(_) => Err(CatalogError::Timeout { op }),
    }
}
