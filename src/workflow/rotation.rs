use std::time::Duration;

use tokio::time::Instant;

use crate::contracts::{OcspResponderApi, SuiteError, TslProviderApi};
use crate::evidence::{DownloadEvidenceCheck, OcspEvidenceCheck};
use crate::state::SequenceTracker;
use crate::workflow::RotationStep;

/// What one rotation observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationOutcome {
    pub offered_seq_nr: u64,
    /// Highest TSL sequence number seen in OCSP requests for the signer.
    pub ocsp_seq_nr_seen: Option<u64>,
    /// Time spent waiting for the signer OCSP request.
    pub ocsp_wait: Duration,
    /// Time slept afterwards to let the SUT activate the TSL.
    pub settled_for: Duration,
}

/// Both rotations of a trust-anchor switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustAnchorSwitchOutcome {
    /// TSL signed by the current anchor announcing the new one.
    pub announce: RotationOutcome,
    /// TSL signed by the new anchor.
    pub adopt: RotationOutcome,
}

/// Offers a new TSL to the SUT and waits until it has been adopted.
///
/// Every rotation runs four phases in order, none skipped:
/// 1. prime: offer the TSL and configure the OCSP responder for its signer,
/// 2. await the download of the offered TSL,
/// 3. await the OCSP request for the signer certificate,
/// 4. settle for what is left of the TSL processing time.
///
/// A failing phase aborts the rotation.
pub struct RotationWorkflow<'a, O: OcspResponderApi, T: TslProviderApi> {
    ocsp_responder: &'a O,
    tsl_provider: &'a T,
    poll_interval: Duration,
}

impl<'a, O: OcspResponderApi, T: TslProviderApi> RotationWorkflow<'a, O, T> {
    pub fn new(ocsp_responder: &'a O, tsl_provider: &'a T, poll_interval: Duration) -> Self {
        Self {
            ocsp_responder,
            tsl_provider,
            poll_interval,
        }
    }

    /// Probes both mock services.
    pub async fn ensure_healthy(&self) -> Result<(), SuiteError> {
        self.ocsp_responder.health().await?;
        self.tsl_provider.health().await?;
        Ok(())
    }

    pub async fn rotate(
        &self,
        tracker: &mut SequenceTracker,
        step: &RotationStep,
    ) -> Result<RotationOutcome, SuiteError> {
        self.ensure_healthy().await?;

        tracing::info!(
            seq_nr = step.tsl_seq_nr,
            signer = %step.signer.name,
            current_in_sut = tracker.current_in_sut(),
            "Starting TSL rotation"
        );

        self.prime(tracker, step).await?;

        DownloadEvidenceCheck::new(
            self.tsl_provider,
            step.timing.download_interval_secs,
            self.poll_interval,
        )
        .wait_for_download(step.tsl_seq_nr, step.endpoints, true)
        .await?;

        // The SUT validates the new signer while still running its current TSL.
        tracker.set_expected(tracker.current_in_sut());
        let started = Instant::now();
        let ocsp_seq_nr_seen = OcspEvidenceCheck::new(self.ocsp_responder, self.poll_interval)
            .check(
                step.signer.cert_serial_nr,
                tracker,
                step.timing.ocsp_processing_time_secs,
                step.signer_ocsp,
            )
            .await?;
        let ocsp_wait = started.elapsed();

        let settled_for = step.timing.tsl_processing_time().saturating_sub(ocsp_wait);
        if !settled_for.is_zero() {
            tracing::debug!(settle = ?settled_for, "Waiting for SUT to activate TSL");
            tokio::time::sleep(settled_for).await;
        }

        tracing::info!(
            seq_nr = step.tsl_seq_nr,
            ocsp_seq_nr_seen = ?ocsp_seq_nr_seen,
            "TSL rotation complete"
        );

        Ok(RotationOutcome {
            offered_seq_nr: step.tsl_seq_nr,
            ocsp_seq_nr_seen,
            ocsp_wait,
            settled_for,
        })
    }

    /// Offers `step`'s TSL and waits for the SUT to download it, without the
    /// OCSP phase. Establishes a known starting state and saves it.
    pub async fn initial_download(
        &self,
        tracker: &mut SequenceTracker,
        step: &RotationStep,
    ) -> Result<(), SuiteError> {
        self.ensure_healthy().await?;

        self.tsl_provider
            .configure(&step.tsl_provider_config())
            .await?;
        tracker.record_offered(step.tsl_seq_nr)?;

        DownloadEvidenceCheck::new(
            self.tsl_provider,
            step.timing.download_interval_secs,
            self.poll_interval,
        )
        .wait_for_download(step.tsl_seq_nr, step.endpoints, true)
        .await?;

        tokio::time::sleep(step.timing.tsl_processing_time()).await;
        tracker.save(step.tsl_seq_nr)?;
        Ok(())
    }

    /// Switches the SUT to a new trust anchor.
    ///
    /// `announce` is signed by the current anchor and carries the new one,
    /// `adopt` is signed by the new anchor. `initial` runs first when the
    /// starting state of the SUT is not known yet. Each TSL is saved as
    /// current once its rotation completed.
    pub async fn trust_anchor_switch(
        &self,
        tracker: &mut SequenceTracker,
        initial: Option<&RotationStep>,
        announce: &RotationStep,
        adopt: &RotationStep,
    ) -> Result<TrustAnchorSwitchOutcome, SuiteError> {
        if let Some(initial) = initial {
            self.initial_download(tracker, initial).await?;
        }

        let announce_outcome = self.rotate(tracker, announce).await?;
        tracker.save(announce.tsl_seq_nr)?;

        let adopt_outcome = self.rotate(tracker, adopt).await?;
        tracker.save(adopt.tsl_seq_nr)?;

        Ok(TrustAnchorSwitchOutcome {
            announce: announce_outcome,
            adopt: adopt_outcome,
        })
    }

    async fn prime(
        &self,
        tracker: &mut SequenceTracker,
        step: &RotationStep,
    ) -> Result<(), SuiteError> {
        self.ocsp_responder
            .configure(&step.signer_ocsp_config())
            .await?;
        self.tsl_provider
            .configure(&step.tsl_provider_config())
            .await?;
        tracker.record_offered(step.tsl_seq_nr)?;
        Ok(())
    }
}
