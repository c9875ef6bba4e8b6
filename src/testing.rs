//! In-memory doubles of the mock services for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::contracts::{
    ClientError, OcspHistoryQuery, OcspRequestHistoryEntry, OcspResponderApi,
    OcspResponderConfig, TslDownloadPoint, TslHistoryQuery, TslProviderApi, TslProviderConfig,
    TslRequestHistoryEntry,
};

pub fn ocsp_entry(tsl_seq_nr: u64, cert_serial_nr: u128) -> OcspRequestHistoryEntry {
    OcspRequestHistoryEntry {
        tsl_seq_nr,
        cert_serial_nr,
        timestamp: "2024-05-01T12:00:00Z".into(),
        request: Vec::new(),
    }
}

#[derive(Default)]
pub struct FakeOcspResponder {
    history: Mutex<Vec<OcspRequestHistoryEntry>>,
    configs: Mutex<Vec<OcspResponderConfig>>,
    clear_calls: AtomicUsize,
    ignore_filters: bool,
    unhealthy: bool,
    scripted_requests: Mutex<VecDeque<u64>>,
}

impl FakeOcspResponder {
    /// Answers every history query with the full history.
    pub fn ignoring_filters(mut self) -> Self {
        self.ignore_filters = true;
        self
    }

    pub fn unhealthy(mut self) -> Self {
        self.unhealthy = true;
        self
    }

    /// On each `configure`, simulates the SUT asking for the configured
    /// certificate with the next of these TSL sequence numbers.
    pub fn with_scripted_requests(self, seq_nrs: &[u64]) -> Self {
        self.scripted_requests
            .lock()
            .unwrap()
            .extend(seq_nrs.iter().copied());
        self
    }

    pub fn push(&self, entry: OcspRequestHistoryEntry) {
        self.history.lock().unwrap().push(entry);
    }

    pub fn clear_calls(&self) -> usize {
        self.clear_calls.load(Ordering::SeqCst)
    }

    pub fn configs(&self) -> Vec<OcspResponderConfig> {
        self.configs.lock().unwrap().clone()
    }
}

impl OcspResponderApi for FakeOcspResponder {
    async fn health(&self) -> Result<(), ClientError> {
        if self.unhealthy {
            return Err(ClientError::HealthCheck {
                service: "OCSP responder".into(),
                status: 503,
            });
        }
        Ok(())
    }

    async fn configure(&self, config: &OcspResponderConfig) -> Result<(), ClientError> {
        self.configs.lock().unwrap().push(config.clone());
        let scripted = self.scripted_requests.lock().unwrap().pop_front();
        if let Some(seq_nr) = scripted {
            self.push(ocsp_entry(seq_nr, config.cert_serial_nr));
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), ClientError> {
        self.clear_calls.fetch_add(1, Ordering::SeqCst);
        self.history.lock().unwrap().clear();
        Ok(())
    }

    async fn history(
        &self,
        query: &OcspHistoryQuery,
    ) -> Result<Vec<OcspRequestHistoryEntry>, ClientError> {
        let history = self.history.lock().unwrap();
        Ok(history
            .iter()
            .filter(|e| self.ignore_filters || query.matches(e))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct FakeTslProvider {
    history: Mutex<Vec<TslRequestHistoryEntry>>,
    configs: Mutex<Vec<TslProviderConfig>>,
    clear_calls: AtomicUsize,
    ignore_filters: bool,
    auto_download: Option<TslDownloadPoint>,
}

impl FakeTslProvider {
    /// Simulates the SUT downloading every offered TSL through `point`.
    pub fn downloading_via(mut self, point: TslDownloadPoint) -> Self {
        self.auto_download = Some(point);
        self
    }

    pub fn ignoring_filters(mut self) -> Self {
        self.ignore_filters = true;
        self
    }

    pub fn push(&self, entry: TslRequestHistoryEntry) {
        self.history.lock().unwrap().push(entry);
    }

    pub fn clear_calls(&self) -> usize {
        self.clear_calls.load(Ordering::SeqCst)
    }

    pub fn configs(&self) -> Vec<TslProviderConfig> {
        self.configs.lock().unwrap().clone()
    }
}

impl TslProviderApi for FakeTslProvider {
    async fn health(&self) -> Result<(), ClientError> {
        Ok(())
    }

    async fn configure(&self, config: &TslProviderConfig) -> Result<(), ClientError> {
        self.configs.lock().unwrap().push(config.clone());
        if let Some(endpoint) = self.auto_download {
            self.push(TslRequestHistoryEntry {
                tsl_seq_nr: config.tsl_seq_nr,
                endpoint,
                was_compressed: false,
                protocol: "HTTP/1.1".into(),
            });
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), ClientError> {
        self.clear_calls.fetch_add(1, Ordering::SeqCst);
        self.history.lock().unwrap().clear();
        Ok(())
    }

    async fn history(
        &self,
        query: &TslHistoryQuery,
    ) -> Result<Vec<TslRequestHistoryEntry>, ClientError> {
        let history = self.history.lock().unwrap();
        Ok(history
            .iter()
            .filter(|e| self.ignore_filters || query.matches(e))
            .cloned()
            .collect())
    }
}
