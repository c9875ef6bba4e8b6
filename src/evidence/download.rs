use std::time::Duration;

use crate::contracts::{
    DownloadEndpointSet, HistoryDeleteOption, Match, SuiteError, TslHistoryQuery, TslProviderApi,
};
use crate::evidence::{poll_until, with_cleanup};

/// Endpoint set a rotation waits on unless told otherwise.
pub const DEFAULT_DOWNLOAD_ENDPOINTS: DownloadEndpointSet = DownloadEndpointSet::XmlEndpoints;

/// Confirms from the mock TSL provider's history that the SUT downloaded a
/// given TSL. Download evidence is always mandatory: a timeout is an error.
///
/// The provider must already serve the TSL; this check only observes.
pub struct DownloadEvidenceCheck<'a, T: TslProviderApi> {
    provider: &'a T,
    download_interval_secs: u64,
    poll_interval: Duration,
}

impl<'a, T: TslProviderApi> DownloadEvidenceCheck<'a, T> {
    /// `download_interval_secs` is the SUT's download interval and bounds the wait.
    pub fn new(provider: &'a T, download_interval_secs: u64, poll_interval: Duration) -> Self {
        Self {
            provider,
            download_interval_secs,
            poll_interval,
        }
    }

    /// Waits until the provider recorded a download of `expected_seq_nr`
    /// through one of `endpoints`.
    ///
    /// With `clear_after`, the provider configuration is cleared afterwards on
    /// every exit path.
    pub async fn wait_for_download(
        &self,
        expected_seq_nr: u64,
        endpoints: DownloadEndpointSet,
        clear_after: bool,
    ) -> Result<(), SuiteError> {
        let wait = self.poll_for_download(expected_seq_nr, endpoints);
        if clear_after {
            with_cleanup("clear TSL provider", wait, self.provider.clear()).await
        } else {
            wait.await
        }
    }

    async fn poll_for_download(
        &self,
        expected_seq_nr: u64,
        endpoints: DownloadEndpointSet,
    ) -> Result<(), SuiteError> {
        let name = format!("TSL download of seqNr {} via {:?}", expected_seq_nr, endpoints);
        let query = TslHistoryQuery {
            sequence_nr: Match::Exact(expected_seq_nr),
            history_delete_option: HistoryDeleteOption::DeleteNothing,
        };
        let provider = self.provider;

        tracing::info!(
            seq_nr = expected_seq_nr,
            endpoints = ?endpoints,
            timeout_secs = self.download_interval_secs,
            "Waiting for SUT to download TSL"
        );

        let elapsed = poll_until(
            &name,
            self.download_interval_secs,
            self.poll_interval,
            || async move {
                let entries = provider.history(&query).await?;
                if let Some(stray) = entries.iter().find(|e| e.tsl_seq_nr != expected_seq_nr) {
                    return Err(SuiteError::InvariantViolation(format!(
                        "TSL provider answered a query for seqNr {} with an entry for seqNr {}",
                        expected_seq_nr, stray.tsl_seq_nr
                    )));
                }
                Ok(entries.iter().any(|e| endpoints.contains(e.endpoint)))
            },
        )
        .await?;

        tracing::info!(
            seq_nr = expected_seq_nr,
            elapsed_secs = elapsed,
            "SUT downloaded TSL"
        );
        Ok(())
    }

    /// Sequence number of the last download matching `seq_nr` on any
    /// endpoint, or `None` if the history holds none.
    pub async fn last_downloaded_seq_nr(
        &self,
        seq_nr: Match<u64>,
    ) -> Result<Option<u64>, SuiteError> {
        let query = TslHistoryQuery {
            sequence_nr: seq_nr,
            history_delete_option: HistoryDeleteOption::DeleteNothing,
        };
        let entries = self.provider.history(&query).await?;
        Ok(entries
            .iter()
            .rev()
            .find(|e| DownloadEndpointSet::AnyEndpoint.contains(e.endpoint))
            .map(|e| e.tsl_seq_nr))
    }
}
