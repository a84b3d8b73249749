//! Poll-until-condition primitive
//!
//! Used for conditions the providers offer no native blocking wait for
//! (DKIM verification status). Poller errors count as "not ready yet".

use crate::config::WaitSpec;
use crate::error::{Error, Result};
use std::future::Future;
use tracing::{debug, warn};

/// Poll `poller` until `tester` accepts its state
///
/// After a failed attempt `n` (zero-based) the loop sleeps
/// `spec.delay * n²`, so the first retry follows immediately. Exhausting
/// `spec.max_attempts` yields [`Error::WaitTimeout`] carrying
/// `failure_message`.
pub async fn wait_for<S, P, Fut, T>(
    mut poller: P,
    mut tester: T,
    spec: &WaitSpec,
    failure_message: &str,
) -> Result<S>
where
    P: FnMut() -> Fut,
    Fut: Future<Output = Result<S>>,
    T: FnMut(&S) -> bool,
{
    for attempt in 0..spec.max_attempts {
        match poller().await {
            Ok(state) if tester(&state) => return Ok(state),
            Ok(_) => debug!("Wait attempt {} not satisfied", attempt),
            Err(e) if e.is_transient() => {
                debug!("Wait attempt {} failed, retrying: {}", attempt, e)
            }
            Err(e) => warn!("Wait attempt {} failed with {}, retrying", attempt, e),
        }

        if attempt + 1 < spec.max_attempts {
            tokio::time::sleep(spec.delay.saturating_mul(attempt.saturating_mul(attempt))).await;
        }
    }

    Err(Error::wait_timeout(failure_message))
}
