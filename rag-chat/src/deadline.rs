use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::{RagError, Result};

/// Run a collaborator call, failing with [`RagError::Timeout`] once `timeout` elapses.
///
/// The inner future is dropped on expiry, which is how abandoned calls are cancelled.
pub(crate) async fn with_deadline<T>(
    operation: &str,
    timeout: Duration,
    call: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => {
            warn!(operation, ?timeout, "collaborator call timed out");
            Err(RagError::Timeout { operation: operation.to_string(), timeout })
        }
    }
}
