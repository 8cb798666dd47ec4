//! Timeout helper.

use std::future::Future;
use std::time::Duration;

use crate::error::MonologueError;

/// Wrap a future with an optional timeout; `None` defers to the transport.
pub async fn with_timeout<T>(
    duration: Option<Duration>,
    future: impl Future<Output = Result<T, MonologueError>>,
) -> Result<T, MonologueError> {
    let Some(duration) = duration else {
        return future.await;
    };
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(MonologueError::Timeout(duration.as_millis() as u64)),
    }
}
