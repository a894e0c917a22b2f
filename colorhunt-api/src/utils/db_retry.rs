//! Transaction retry
//!
//! SQLite reports a conflicting concurrent transaction as BUSY/LOCKED (or
//! BUSY_SNAPSHOT when a deferred read transaction tries to upgrade after
//! another writer committed). The whole read-modify-write closure is rerun,
//! so every attempt re-reads current state.

use std::future::Future;
use std::time::{Duration, Instant};

use colorhunt_common::{Error, Result};

const INITIAL_BACKOFF_MS: u64 = 10;
const MAX_BACKOFF_MS: u64 = 1000;

/// Retry a transactional operation with exponential backoff until `max_wait_ms` elapses
///
/// Backoff starts at 10ms and doubles up to 1s. Errors other than transient
/// store conflicts are returned immediately. When the budget is spent the
/// conflict surfaces as `Error::TransactionConflict`.
pub async fn retry_on_conflict<F, Fut, T>(
    operation_name: &str,
    max_wait_ms: u64,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let start_time = Instant::now();
    let max_duration = Duration::from_millis(max_wait_ms);
    let mut attempt = 0u32;
    let mut backoff_ms = INITIAL_BACKOFF_MS;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    let elapsed_ms = start_time.elapsed().as_millis();
                    if elapsed_ms > 2000 {
                        tracing::warn!(
                            operation = operation_name,
                            attempt,
                            elapsed_ms = elapsed_ms,
                            "Transaction committed after a long retry period"
                        );
                    } else {
                        tracing::debug!(
                            operation = operation_name,
                            attempt,
                            elapsed_ms = elapsed_ms,
                            "Transaction committed after retry"
                        );
                    }
                }
                return Ok(result);
            }
            Err(err) if err.is_transient_conflict() => {
                let elapsed = start_time.elapsed();

                if elapsed >= max_duration {
                    tracing::error!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = elapsed.as_millis(),
                        max_wait_ms,
                        error = %err,
                        "Transaction abandoned: retry budget exhausted"
                    );
                    return Err(Error::TransactionConflict(format!(
                        "{} still conflicting after {} attempts ({} ms)",
                        operation_name,
                        attempt,
                        elapsed.as_millis()
                    )));
                }

                // Never sleep past the budget
                let sleep_ms = backoff_ms.min(
                    max_duration
                        .saturating_sub(elapsed)
                        .as_millis()
                        .max(1) as u64,
                );

                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    elapsed_ms = elapsed.as_millis(),
                    backoff_ms = sleep_ms,
                    "Transaction conflict, retrying"
                );

                tokio::time::sleep(Duration::from_millis(sleep_ms)).await;
                backoff_ms = (backoff_ms * 2).min(MAX_BACKOFF_MS);
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[tokio::test]
    async fn test_retry_succeeds_first_attempt() {
        let result = retry_on_conflict("test_op", 5000, || async { Ok::<i32, Error>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_non_conflict_error_fails_immediately() {
        let attempts = Cell::new(0);

        let result = retry_on_conflict("test_op", 5000, || {
            attempts.set(attempts.get() + 1);
            async { Err::<i32, Error>(Error::NotFound("pack".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(Error::NotFound(_))));
        assert_eq!(attempts.get(), 1);
    }

    #[tokio::test]
    async fn test_message_alone_is_not_a_conflict() {
        // Only errors raised by the store count as conflicts
        let attempts = Cell::new(0);

        let result = retry_on_conflict("test_op", 5000, || {
            attempts.set(attempts.get() + 1);
            async { Err::<i32, Error>(Error::Internal("database is locked".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(Error::Internal(_))));
        assert_eq!(attempts.get(), 1);
    }
}
