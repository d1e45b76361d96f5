//! Generic fixed-delay retry for fallible network operations.

use std::future::Future;
use std::time::Duration;

use tracing::{error, warn};

/// Runs `operation` up to `max_attempts` times, sleeping `base_delay`
/// between attempts. The delay is fixed per attempt, not exponential. On
/// exhaustion the last observed error is returned.
pub async fn with_retry<T, E, F, Fut>(
    max_attempts: u32,
    base_delay: Duration,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_attempts => {
                warn!("Attempt {attempt}/{max_attempts} failed: {e}, retrying in {base_delay:?}");
                tokio::time::sleep(base_delay).await;
                attempt += 1;
            }
            Err(e) => {
                error!("All {max_attempts} attempts failed");
                return Err(e);
            }
        }
    }
}
