//! Store call timeout helpers
//!
//! Every round trip to the data service is bounded so a hung connection
//! surfaces as [`StoreError::Timeout`] instead of blocking the caller.

use std::time::Duration;
use tokio::time::timeout;

use super::errors::{StoreError, StoreResult};

/// Default timeout for store queries (5 seconds)
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Default timeout for batch writes (10 seconds)
pub const DEFAULT_BATCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Execute a store operation with timeout
///
/// # Example
///
/// ```no_run
/// use pickle_cup::db::timeouts::{with_timeout, DEFAULT_QUERY_TIMEOUT};
/// use pickle_cup::db::{MemoryStore, PlayerRepository};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let players = with_timeout(DEFAULT_QUERY_TIMEOUT, store.search_players("ann", 10)).await?;
/// # let _ = players;
/// # Ok(())
/// # }
/// ```
pub async fn with_timeout<F, T>(duration: Duration, future: F) -> StoreResult<T>
where
    F: std::future::Future<Output = StoreResult<T>>,
{
    match timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(duration)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_timeout_constants() {
        assert_eq!(DEFAULT_QUERY_TIMEOUT.as_secs(), 5);
        assert_eq!(DEFAULT_BATCH_TIMEOUT.as_secs(), 10);
    }

    #[tokio::test]
    async fn test_slow_operation_times_out() {
        let result: StoreResult<()> = with_timeout(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(())
        })
        .await;

        assert!(matches!(result, Err(StoreError::Timeout(d)) if d == Duration::from_millis(10)));
    }

    #[tokio::test]
    async fn test_inner_error_passes_through() {
        let result: StoreResult<()> =
            with_timeout(DEFAULT_QUERY_TIMEOUT, async {
                Err(StoreError::Malformed("bad".to_string()))
            })
            .await;

        assert!(matches!(result, Err(StoreError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_timeout_error_display() {
        let err = StoreError::Timeout(Duration::from_secs(5));
        assert!(err.to_string().contains("timed out"));
        assert!(err.to_string().contains("5s"));
    }
}
