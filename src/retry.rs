use std::future::Future;

use thiserror::Error;

/// All attempts of a retried operation failed.
///
/// Carries the attempt count and the error from the final attempt, so a
/// caller can always tell exhaustion apart from success on a later attempt.
#[derive(Error, Debug)]
#[error("Giving up after {attempts} attempts: {source}")]
pub struct RetriesExhausted<E: std::error::Error> {
    pub attempts: u32,
    #[source]
    pub source: E,
}

/// Drive an async operation to at most `max_attempts` total attempts.
///
/// Failed attempts are re-invoked immediately, without backoff. Returns the
/// first success, or [`RetriesExhausted`] wrapping the last error.
pub async fn with_retries<T, E, F, Fut>(
    max_attempts: u32,
    mut operation: F,
) -> Result<T, RetriesExhausted<E>>
where
    E: std::error::Error,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(source) if attempt >= max_attempts => {
                return Err(RetriesExhausted {
                    attempts: attempt,
                    source,
                });
            }
            Err(_) => attempt += 1,
        }
    }
}
