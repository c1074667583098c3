//! Caller-side deadline racing for comparison thunks

use crate::error::DeadlineError;
use std::future::Future;
use std::time::Duration;

/// Race `operation` against `limit`
///
/// An elapsed deadline becomes an ordinary error value, so the comparator
/// records it like any other failure of that side.
///
/// # Errors
/// - `DeadlineError::Elapsed` if `limit` passes first
/// - `DeadlineError::Inner` if the operation fails
pub async fn with_deadline<T, E, F>(limit: Duration, operation: F) -> Result<T, DeadlineError<E>>
where
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(limit, operation).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(DeadlineError::Inner(e)),
        Err(_) => Err(DeadlineError::Elapsed(limit)),
    }
}
