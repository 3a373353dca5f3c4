use std::future::Future;
use std::time::Duration;

use crate::error::{VectorSearchError, VectorSearchResult};

/// Run an external call under a deadline; expiry becomes `VectorSearchError::Timeout`
pub(crate) async fn with_deadline<T, F>(
    operation: &str,
    after: Duration,
    call: F,
) -> VectorSearchResult<T>
where
    F: Future<Output = VectorSearchResult<T>>,
{
    match tokio::time::timeout(after, call).await {
        Ok(result) => result,
        Err(_) => Err(VectorSearchError::Timeout {
            operation: operation.to_string(),
            after,
        }),
    }
}
