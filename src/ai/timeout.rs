//! Timeout helpers
//!
//! Wraps async operations with a deadline and converts expiry into
//! [`PrdError::Timeout`].
//!
//! ```ignore
//! let result = with_timeout(
//!     Duration::from_secs(300),
//!     async { session.drive().await },
//!     "generation session",
//! ).await?;
//! ```

use std::future::Future;
use std::time::Duration;

use crate::types::{PrdError, Result};

/// Execute an async operation with a timeout
///
/// Returns a timeout error if the operation doesn't complete within the specified duration.
pub async fn with_timeout<T, F>(timeout: Duration, future: F, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(PrdError::timeout(operation_name, timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_timeout_success() {
        let result = with_timeout(
            Duration::from_secs(1),
            async { Ok::<_, PrdError>(42) },
            "test operation",
        )
        .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_with_timeout_expires() {
        let result = with_timeout(
            Duration::from_millis(10),
            async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<_, PrdError>(42)
            },
            "slow operation",
        )
        .await;
        assert!(matches!(result.unwrap_err(), PrdError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_with_timeout_passes_inner_error() {
        let result: Result<()> = with_timeout(
            Duration::from_secs(1),
            async { Err(PrdError::Cancelled) },
            "failing operation",
        )
        .await;
        assert!(matches!(result.unwrap_err(), PrdError::Cancelled));
    }
}
