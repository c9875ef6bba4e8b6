use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::contracts::SuiteError;

/// Delay between two predicate evaluations unless the caller overrides it.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Evaluates `predicate` until it returns `true` or `timeout_secs` elapse.
///
/// The first evaluation happens immediately, later ones exactly one
/// `poll_interval` after the previous one finished. Returns the elapsed whole
/// seconds on success. `timeout_secs` is a lower bound: `EvidenceTimeout` is
/// never returned earlier, and may come up to one interval later. An error
/// from the predicate aborts the poll and is returned as is.
pub async fn poll_until<F, Fut>(
    name: &str,
    timeout_secs: u64,
    poll_interval: Duration,
    mut predicate: F,
) -> Result<u64, SuiteError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, SuiteError>>,
{
    let timeout = Duration::from_secs(timeout_secs);
    let poll_interval = poll_interval.max(Duration::from_millis(1));
    let start = Instant::now();
    let mut attempts: u32 = 0;

    loop {
        attempts = attempts.saturating_add(1);
        if predicate().await? {
            let elapsed = start.elapsed().as_secs();
            tracing::debug!(name, attempts, elapsed_secs = elapsed, "Evidence observed");
            return Ok(elapsed);
        }

        if start.elapsed() >= timeout {
            break;
        }
        tokio::time::sleep(poll_interval).await;
    }

    tracing::debug!(name, attempts, timeout_secs, "Evidence not observed before timeout");
    Err(SuiteError::EvidenceTimeout {
        name: name.to_string(),
        timeout_secs,
    })
}
