use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::SuiteConfig;
use crate::contracts::{
    CertificateStatus, DownloadEndpointSet, ExpectationBehavior, OcspResponderConfig,
    TslDownloadPoint, TslProviderConfig,
};
use crate::evidence::DEFAULT_DOWNLOAD_ENDPOINTS;

/// Time budgets of one rotation, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationTiming {
    /// Upper bound for the SUT to download an offered TSL.
    pub download_interval_secs: u64,
    /// Time the SUT needs to activate a downloaded TSL.
    pub tsl_processing_time_secs: u64,
    /// Upper bound for the SUT to issue an OCSP request for the TSL signer.
    pub ocsp_processing_time_secs: u64,
}

impl RotationTiming {
    pub fn tsl_processing_time(&self) -> Duration {
        Duration::from_secs(self.tsl_processing_time_secs)
    }
}

impl From<&SuiteConfig> for RotationTiming {
    fn from(config: &SuiteConfig) -> Self {
        Self {
            download_interval_secs: config.tsl_download_interval_secs,
            tsl_processing_time_secs: config.tsl_processing_time_secs,
            ocsp_processing_time_secs: config.ocsp_processing_time_secs,
        }
    }
}

/// The certificate that signed the offered TSL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerIdentity {
    pub name: String,
    pub cert_serial_nr: u128,
    /// DER encoding.
    pub certificate: Vec<u8>,
}

/// Everything one rotation needs. Built fresh for every test step.
#[derive(Debug, Clone)]
pub struct RotationStep {
    pub tsl_seq_nr: u64,
    pub tsl_bytes: Vec<u8>,
    pub signer: SignerIdentity,
    /// DER encoding of the trust anchor that issued the signer certificate.
    pub trust_anchor: Vec<u8>,
    /// Download routes that count as evidence for the download.
    pub endpoints: DownloadEndpointSet,
    /// `Expect` or `Optional`; caching in the SUT can make re-validating the
    /// signer legitimately optional.
    pub signer_ocsp: ExpectationBehavior,
    /// Status code per download route while the TSL is offered.
    pub endpoint_status: BTreeMap<TslDownloadPoint, u16>,
    pub timing: RotationTiming,
}

impl RotationStep {
    pub fn new(
        tsl_seq_nr: u64,
        tsl_bytes: Vec<u8>,
        signer: SignerIdentity,
        trust_anchor: Vec<u8>,
        timing: RotationTiming,
    ) -> Self {
        Self {
            tsl_seq_nr,
            tsl_bytes,
            signer,
            trust_anchor,
            endpoints: DEFAULT_DOWNLOAD_ENDPOINTS,
            signer_ocsp: ExpectationBehavior::expect(),
            endpoint_status: BTreeMap::new(),
            timing,
        }
    }

    pub fn with_endpoints(mut self, endpoints: DownloadEndpointSet) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Tolerates the SUT not asking for the signer's status.
    pub fn with_optional_signer_ocsp(mut self) -> Self {
        self.signer_ocsp = ExpectationBehavior::Optional;
        self
    }

    pub fn with_endpoint_status(mut self, point: TslDownloadPoint, status: u16) -> Self {
        self.endpoint_status.insert(point, status);
        self
    }

    pub(crate) fn tsl_provider_config(&self) -> TslProviderConfig {
        TslProviderConfig {
            tsl_seq_nr: self.tsl_seq_nr,
            tsl_bytes: self.tsl_bytes.clone(),
            status_codes: self.endpoint_status.clone(),
        }
    }

    pub(crate) fn signer_ocsp_config(&self) -> OcspResponderConfig {
        OcspResponderConfig {
            cert_serial_nr: self.signer.cert_serial_nr,
            certificate: self.signer.certificate.clone(),
            issuer_certificate: self.trust_anchor.clone(),
            certificate_status: CertificateStatus::Good,
            response_delay_millis: 0,
        }
    }
}
