use std::collections::BTreeMap;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::contracts::error::ClientError;
use crate::contracts::history::{
    base64_bytes, OcspHistoryQuery, OcspRequestHistoryEntry, TslDownloadPoint, TslHistoryQuery,
    TslRequestHistoryEntry,
};

/// Certificate status the mock OCSP responder reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CertificateStatus {
    #[default]
    Good,
    Revoked,
    Unknown,
}

/// Configuration accepted by the mock OCSP responder's `POST /config`.
///
/// Certificates are opaque DER; response generation lives in the responder.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcspResponderConfig {
    pub cert_serial_nr: u128,
    #[serde(with = "base64_bytes", default)]
    pub certificate: Vec<u8>,
    #[serde(with = "base64_bytes", default)]
    pub issuer_certificate: Vec<u8>,
    #[serde(default)]
    pub certificate_status: CertificateStatus,
    #[serde(default)]
    pub response_delay_millis: u64,
}

/// Configuration accepted by the mock TSL provider's `POST /config`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TslProviderConfig {
    pub tsl_seq_nr: u64,
    #[serde(with = "base64_bytes")]
    pub tsl_bytes: Vec<u8>,
    /// Status code per download route. Routes not listed answer 200.
    #[serde(default)]
    pub status_codes: BTreeMap<TslDownloadPoint, u16>,
}

impl TslProviderConfig {
    pub fn new(tsl_seq_nr: u64, tsl_bytes: Vec<u8>) -> Self {
        Self {
            tsl_seq_nr,
            tsl_bytes,
            status_codes: BTreeMap::new(),
        }
    }

    pub fn with_status(mut self, point: TslDownloadPoint, status: u16) -> Self {
        self.status_codes.insert(point, status);
        self
    }

    pub fn status_for(&self, point: TslDownloadPoint) -> u16 {
        self.status_codes.get(&point).copied().unwrap_or(200)
    }
}

/// The mock OCSP responder as seen by the checks.
pub trait OcspResponderApi: Send + Sync {
    /// Liveness probe. Any non-success answer is a `ClientError::HealthCheck`.
    fn health(&self) -> impl Future<Output = Result<(), ClientError>> + Send;

    fn configure(
        &self,
        config: &OcspResponderConfig,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;

    /// Drops the configuration and the recorded history.
    fn clear(&self) -> impl Future<Output = Result<(), ClientError>> + Send;

    /// Returns matching history entries in arrival order, then applies the
    /// query's delete option on the service side.
    fn history(
        &self,
        query: &OcspHistoryQuery,
    ) -> impl Future<Output = Result<Vec<OcspRequestHistoryEntry>, ClientError>> + Send;
}

/// The mock TSL provider as seen by the checks.
pub trait TslProviderApi: Send + Sync {
    fn health(&self) -> impl Future<Output = Result<(), ClientError>> + Send;

    fn configure(
        &self,
        config: &TslProviderConfig,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;

    /// Drops the offered TSL and the recorded history.
    fn clear(&self) -> impl Future<Output = Result<(), ClientError>> + Send;

    fn history(
        &self,
        query: &TslHistoryQuery,
    ) -> impl Future<Output = Result<Vec<TslRequestHistoryEntry>, ClientError>> + Send;
}
