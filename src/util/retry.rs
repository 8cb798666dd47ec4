//! Retry with exponential backoff and jitter.

use std::future::Future;
use std::time::Duration;

use crate::error::MonologueError;

/// Retry policy for a single endpoint call.
///
/// The default makes exactly one attempt: a failed segment request aborts the
/// run unless a caller opts into retries.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Initial backoff duration.
    pub initial_backoff: Duration,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
    /// Backoff multiplier.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Policy allowing up to `max_attempts` attempts (clamped to at least one).
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Execute an async operation with retry.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, MonologueError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, MonologueError>>,
    {
        let mut backoff = self.initial_backoff;
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if !e.is_retryable() || attempt >= attempts {
                        return Err(e);
                    }

                    tracing::warn!(
                        attempt,
                        max_attempts = attempts,
                        error = %e,
                        "Retrying after error"
                    );

                    // Jitter: 75%-125% of backoff
                    let jitter_factor = 0.75 + (rand_factor() * 0.5);
                    tokio::time::sleep(Duration::from_secs_f64(
                        backoff.as_secs_f64() * jitter_factor,
                    ))
                    .await;

                    backoff = Duration::from_secs_f64(
                        (backoff.as_secs_f64() * self.multiplier)
                            .min(self.max_backoff.as_secs_f64()),
                    );
                }
            }
        }
    }
}

/// Jitter source in `[0, 1)`: clock nanos and thread id hashed together.
fn rand_factor() -> f64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos()
        .hash(&mut hasher);
    std::thread::current().id().hash(&mut hasher);

    (hasher.finish() % 10000) as f64 / 10000.0
}
