//! Evidence checks: bounded-time polling of the mock services' request
//! histories for proof that the SUT performed an expected network action.

mod download;
mod ocsp;
mod poller;

use std::future::Future;

pub use download::{DownloadEvidenceCheck, DEFAULT_DOWNLOAD_ENDPOINTS};
pub use ocsp::OcspEvidenceCheck;
pub use poller::{poll_until, DEFAULT_POLL_INTERVAL};

use crate::contracts::{ClientError, SuiteError};

/// Runs `body`, then `cleanup`, whatever the outcome of `body`.
///
/// A cleanup failure is returned only when `body` succeeded. When `body`
/// already failed, the cleanup failure is logged and the original error wins.
pub(crate) async fn with_cleanup<T, B, C>(
    what: &str,
    body: B,
    cleanup: C,
) -> Result<T, SuiteError>
where
    B: Future<Output = Result<T, SuiteError>>,
    C: Future<Output = Result<(), ClientError>>,
{
    let outcome = body.await;
    let cleaned = cleanup.await;

    match (outcome, cleaned) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(cleanup_err)) => Err(cleanup_err.into()),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(cleanup_err)) => {
            tracing::warn!(
                cleanup = what,
                error = %cleanup_err,
                original_error = %err,
                "Cleanup failed while a check was already failing"
            );
            Err(err)
        }
    }
}
