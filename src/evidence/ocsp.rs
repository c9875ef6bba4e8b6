use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::contracts::{
    ExpectationBehavior, HistoryDeleteOption, Match, OcspHistoryQuery, OcspRequestHistoryEntry,
    OcspResponderApi, SuiteError,
};
use crate::evidence::{poll_until, with_cleanup};
use crate::state::SequenceTracker;

/// Confirms or refutes from the mock OCSP responder's history that the SUT
/// asked for the status of a certificate.
///
/// Entries seen by the last [`check`](Self::check) are kept in a local
/// accumulator, separate from the responder's own history.
pub struct OcspEvidenceCheck<'a, O: OcspResponderApi> {
    responder: &'a O,
    poll_interval: Duration,
    observed: Mutex<Vec<OcspRequestHistoryEntry>>,
}

impl<'a, O: OcspResponderApi> OcspEvidenceCheck<'a, O> {
    pub fn new(responder: &'a O, poll_interval: Duration) -> Self {
        Self {
            responder,
            poll_interval,
            observed: Mutex::new(Vec::new()),
        }
    }

    /// Entries accumulated by the last check, in arrival order.
    pub fn observed(&self) -> Vec<OcspRequestHistoryEntry> {
        lock(&self.observed).clone()
    }

    /// Waits up to `ocsp_processing_time_secs` for OCSP requests about
    /// `cert_serial_nr` (any TSL sequence number), clears the responder
    /// configuration, then checks the entries against `behavior` and the
    /// tracker's expected sequence number.
    ///
    /// Polling stops at the first tick that sees any matching entry, so for
    /// `Expect { amount }` with `amount > 1` all requests must already be in
    /// the history by then. Requests arriving later are not counted.
    ///
    /// Returns the highest TSL sequence number among the observed entries,
    /// or `None` when nothing was observed and `behavior` tolerates that.
    pub async fn check(
        &self,
        cert_serial_nr: u128,
        tracker: &SequenceTracker,
        ocsp_processing_time_secs: u64,
        behavior: ExpectationBehavior,
    ) -> Result<Option<u64>, SuiteError> {
        lock(&self.observed).clear();

        let body = self.poll_for_requests(cert_serial_nr, ocsp_processing_time_secs, behavior);
        let found = with_cleanup("clear OCSP responder", body, self.responder.clear()).await?;
        if !found {
            return Ok(None);
        }

        let observed = self.observed();
        if behavior.inspects_history() {
            verify_entries(
                &observed,
                cert_serial_nr,
                tracker.expected_in_sut(),
                behavior,
            )?;
        }

        let max_seq_nr = observed.iter().map(|e| e.tsl_seq_nr).max();
        tracing::info!(
            cert_serial_nr = %cert_serial_nr,
            requests = observed.len(),
            max_seq_nr = ?max_seq_nr,
            "OCSP requests verified"
        );
        Ok(max_seq_nr)
    }

    /// Polls the responder history; `Ok(false)` means a tolerated timeout.
    async fn poll_for_requests(
        &self,
        cert_serial_nr: u128,
        timeout_secs: u64,
        behavior: ExpectationBehavior,
    ) -> Result<bool, SuiteError> {
        let name = format!("OCSP request for serial {}", cert_serial_nr);
        let query = OcspHistoryQuery {
            tsl_seq_nr: Match::Any,
            cert_serial_nr: Match::Exact(cert_serial_nr),
            history_delete_option: HistoryDeleteOption::DeleteNothing,
        };
        let responder = self.responder;
        let observed = &self.observed;

        let outcome = poll_until(&name, timeout_secs, self.poll_interval, || async move {
            let entries = responder.history(&query).await?;
            let found = !entries.is_empty();
            *lock(observed) = entries;
            Ok(found)
        })
        .await;

        match outcome {
            Ok(_) => Ok(true),
            Err(err) if err.is_timeout() && !behavior.timeout_is_fatal() => {
                tracing::info!(
                    cert_serial_nr = %cert_serial_nr,
                    behavior = ?behavior,
                    "No OCSP request observed, tolerated"
                );
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }
}

/// Checks the observed entries against the requested serial, the expected
/// sequence number and, for `Expect`, the exact count.
///
/// A wrong serial or sequence number means the responder answered a query
/// with entries that do not belong to it. Entries that disagree with each
/// other on the sequence number fail the check as ambiguous.
fn verify_entries(
    entries: &[OcspRequestHistoryEntry],
    cert_serial_nr: u128,
    expected_seq_nr: u64,
    behavior: ExpectationBehavior,
) -> Result<(), SuiteError> {
    if let Some(amount) = behavior.expected_amount() {
        if entries.len() != amount {
            return Err(SuiteError::AssertionFailed(format!(
                "expected {} OCSP request(s) for serial {}, observed {}",
                amount,
                cert_serial_nr,
                entries.len()
            )));
        }
    }

    if let Some(entry) = entries.iter().find(|e| e.cert_serial_nr != cert_serial_nr) {
        return Err(SuiteError::InvariantViolation(format!(
            "OCSP responder answered a query for serial {} with an entry for serial {}",
            cert_serial_nr, entry.cert_serial_nr
        )));
    }

    if let Some(first) = entries.first() {
        if entries.iter().any(|e| e.tsl_seq_nr != first.tsl_seq_nr) {
            let seq_nrs: Vec<u64> = entries.iter().map(|e| e.tsl_seq_nr).collect();
            return Err(SuiteError::AssertionFailed(format!(
                "OCSP requests for serial {} carry differing TSL sequence numbers {:?}",
                cert_serial_nr, seq_nrs
            )));
        }
        if first.tsl_seq_nr != expected_seq_nr {
            return Err(SuiteError::InvariantViolation(format!(
                "OCSP request for serial {} recorded TSL seqNr {}, expected {}",
                cert_serial_nr, first.tsl_seq_nr, expected_seq_nr
            )));
        }
    }

    Ok(())
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::testing::{ocsp_entry, FakeOcspResponder};

    const SERIAL: u128 = 10001;

    fn tracker_expecting(dir: &tempfile::TempDir, seq_nr: u64) -> SequenceTracker {
        let mut tracker = SequenceTracker::load(dir.path().join("seq")).unwrap();
        tracker.set_expected(seq_nr);
        tracker
    }

    #[tokio::test(start_paused = true)]
    async fn empty_history_with_expect_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker_expecting(&dir, 3);
        let responder = FakeOcspResponder::default();

        let check = OcspEvidenceCheck::new(&responder, Duration::from_millis(500));
        let err = check
            .check(SERIAL, &tracker, 2, ExpectationBehavior::expect())
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        assert_eq!(responder.clear_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn single_matching_entry_returns_its_seq_nr() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker_expecting(&dir, 3);
        let responder = FakeOcspResponder::default();
        responder.push(ocsp_entry(3, SERIAL));

        let check = OcspEvidenceCheck::new(&responder, Duration::from_millis(500));
        let seen = check
            .check(SERIAL, &tracker, 2, ExpectationBehavior::expect())
            .await
            .unwrap();

        assert_eq!(seen, Some(3));
        assert_eq!(check.observed().len(), 1);
        assert_eq!(responder.clear_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn optional_timeout_returns_none_and_clears() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker_expecting(&dir, 3);
        let responder = FakeOcspResponder::default();
        responder.push(ocsp_entry(3, 99999));

        let check = OcspEvidenceCheck::new(&responder, Duration::from_millis(500));
        let seen = check
            .check(SERIAL, &tracker, 2, ExpectationBehavior::Optional)
            .await
            .unwrap();

        assert_eq!(seen, None);
        assert_eq!(responder.clear_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn wrong_count_fails_the_check() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker_expecting(&dir, 3);
        let responder = FakeOcspResponder::default();
        responder.push(ocsp_entry(3, SERIAL));
        responder.push(ocsp_entry(3, SERIAL));

        let check = OcspEvidenceCheck::new(&responder, Duration::from_millis(500));
        let err = check
            .check(SERIAL, &tracker, 2, ExpectationBehavior::expect())
            .await
            .unwrap_err();

        assert!(matches!(err, SuiteError::AssertionFailed(_)));
        assert_eq!(responder.clear_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expected_amount_greater_than_one() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker_expecting(&dir, 5);
        let responder = FakeOcspResponder::default();
        responder.push(ocsp_entry(5, SERIAL));
        responder.push(ocsp_entry(5, SERIAL));

        let check = OcspEvidenceCheck::new(&responder, Duration::from_millis(500));
        let seen = check
            .check(SERIAL, &tracker, 2, ExpectationBehavior::expect_amount(2))
            .await
            .unwrap();
        assert_eq!(seen, Some(5));
    }

    #[tokio::test(start_paused = true)]
    async fn later_requests_are_not_awaited_for_larger_amounts() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker_expecting(&dir, 5);
        let responder = Arc::new(FakeOcspResponder::default());
        responder.push(ocsp_entry(5, SERIAL));

        let late = Arc::clone(&responder);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            late.push(ocsp_entry(5, SERIAL));
        });

        let check = OcspEvidenceCheck::new(responder.as_ref(), Duration::from_millis(500));
        let err = check
            .check(SERIAL, &tracker, 5, ExpectationBehavior::expect_amount(2))
            .await
            .unwrap_err();

        assert!(
            matches!(err, SuiteError::AssertionFailed(ref msg) if msg.contains("observed 1")),
            "{:?}",
            err
        );
        assert_eq!(check.observed().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expecting_no_requests_passes_on_silence() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker_expecting(&dir, 3);
        let responder = FakeOcspResponder::default();

        let check = OcspEvidenceCheck::new(&responder, Duration::from_millis(500));
        let seen = check
            .check(SERIAL, &tracker, 2, ExpectationBehavior::expect_amount(0))
            .await
            .unwrap();

        assert_eq!(seen, None);
        assert_eq!(responder.clear_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expecting_no_requests_fails_when_one_arrives() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker_expecting(&dir, 3);
        let responder = FakeOcspResponder::default();
        responder.push(ocsp_entry(3, SERIAL));

        let check = OcspEvidenceCheck::new(&responder, Duration::from_millis(500));
        let err = check
            .check(SERIAL, &tracker, 2, ExpectationBehavior::expect_amount(0))
            .await
            .unwrap_err();

        assert!(matches!(err, SuiteError::AssertionFailed(_)), "{:?}", err);
        assert_eq!(responder.clear_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn heterogeneous_seq_nrs_fail_as_ambiguous() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker_expecting(&dir, 5);
        let responder = FakeOcspResponder::default();
        responder.push(ocsp_entry(4, SERIAL));
        responder.push(ocsp_entry(5, SERIAL));

        let check = OcspEvidenceCheck::new(&responder, Duration::from_millis(500));
        let err = check
            .check(SERIAL, &tracker, 2, ExpectationBehavior::expect_amount(2))
            .await
            .unwrap_err();
        assert!(
            matches!(err, SuiteError::AssertionFailed(ref msg) if msg.contains("differing")),
            "{:?}",
            err
        );
    }

    #[tokio::test(start_paused = true)]
    async fn unexpected_seq_nr_is_an_invariant_violation() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker_expecting(&dir, 3);
        let responder = FakeOcspResponder::default();
        responder.push(ocsp_entry(2, SERIAL));

        let check = OcspEvidenceCheck::new(&responder, Duration::from_millis(500));
        let err = check
            .check(SERIAL, &tracker, 2, ExpectationBehavior::expect())
            .await
            .unwrap_err();
        assert!(matches!(err, SuiteError::InvariantViolation(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn responder_ignoring_serial_filter_is_an_invariant_violation() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker_expecting(&dir, 3);
        let responder = FakeOcspResponder::default().ignoring_filters();
        responder.push(ocsp_entry(3, 99999));

        let check = OcspEvidenceCheck::new(&responder, Duration::from_millis(500));
        let err = check
            .check(SERIAL, &tracker, 2, ExpectationBehavior::expect())
            .await
            .unwrap_err();
        assert!(matches!(err, SuiteError::InvariantViolation(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn ignore_skips_assertions_but_reports_max_seq_nr() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker_expecting(&dir, 1);
        let responder = FakeOcspResponder::default();
        responder.push(ocsp_entry(6, SERIAL));
        responder.push(ocsp_entry(7, SERIAL));

        let check = OcspEvidenceCheck::new(&responder, Duration::from_millis(500));
        let seen = check
            .check(SERIAL, &tracker, 2, ExpectationBehavior::Ignore)
            .await
            .unwrap();
        assert_eq!(seen, Some(7));
    }

    #[tokio::test(start_paused = true)]
    async fn accumulator_is_reset_between_checks() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker_expecting(&dir, 3);
        let responder = FakeOcspResponder::default();
        responder.push(ocsp_entry(3, SERIAL));

        let check = OcspEvidenceCheck::new(&responder, Duration::from_millis(500));
        check
            .check(SERIAL, &tracker, 2, ExpectationBehavior::expect())
            .await
            .unwrap();
        assert_eq!(check.observed().len(), 1);

        // The fake's clear dropped its history, so the second check sees nothing.
        let seen = check
            .check(SERIAL, &tracker, 2, ExpectationBehavior::Optional)
            .await
            .unwrap();
        assert_eq!(seen, None);
        assert!(check.observed().is_empty());
    }
}
