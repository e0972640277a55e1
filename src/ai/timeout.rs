//! Wall-Clock Timeouts
//!
//! The pipelines run without per-call deadlines. Only the single-shot path
//! bounds its total runtime, through [`with_timeout`].
//!
//! ```ignore
//! use crate::ai::timeout::with_timeout;
//!
//! let record = with_timeout(
//!     Duration::from_secs(120),
//!     async { analyze_one(&ctx, &target).await },
//!     "single-file analysis",
//! ).await?;
//! ```

use std::future::Future;
use std::time::Duration;

use crate::constants::analysis as analysis_constants;
use crate::types::{Result, StrataError};

/// Default wall-clock limit for single-shot analysis
pub fn single_shot_default() -> Duration {
    Duration::from_secs(analysis_constants::SINGLE_SHOT_TIMEOUT_SECS)
}

/// Execute an async operation with a timeout
///
/// Returns [`StrataError::Timeout`] if the operation doesn't complete within
/// `timeout`. The inner future is dropped on expiry.
pub async fn with_timeout<T, F>(timeout: Duration, future: F, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(StrataError::timeout(operation_name, timeout)),
    }
}
