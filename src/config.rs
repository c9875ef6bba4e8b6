//! Run configuration read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use crate::evidence::DEFAULT_POLL_INTERVAL;

/// Configuration for one test run against the mock services.
#[derive(Debug, Clone)]
pub struct SuiteConfig {
    /// Base URI of the mock OCSP responder.
    pub ocsp_responder_uri: String,
    /// Base URI of the mock TSL provider.
    pub tsl_provider_uri: String,
    /// File holding the persisted TSL sequence number.
    pub seq_nr_file: PathBuf,
    /// Interval in which the SUT downloads the TSL; bounds every download wait.
    pub tsl_download_interval_secs: u64,
    /// Time the SUT needs to activate a downloaded TSL.
    pub tsl_processing_time_secs: u64,
    /// Time the SUT needs to issue an OCSP request once it decided to.
    pub ocsp_processing_time_secs: u64,
    /// Delay between two evaluations of a polling predicate.
    pub poll_interval: Duration,
    /// Timeout of each HTTP request to a mock service.
    pub http_timeout_secs: u64,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            ocsp_responder_uri: "http://localhost:8083".into(),
            tsl_provider_uri: "http://localhost:8084".into(),
            seq_nr_file: PathBuf::from("./tsl-seq-nr.txt"),
            tsl_download_interval_secs: 60,
            tsl_processing_time_secs: 3,
            ocsp_processing_time_secs: 1,
            poll_interval: DEFAULT_POLL_INTERVAL,
            http_timeout_secs: 10,
        }
    }
}

impl SuiteConfig {
    /// Creates a SuiteConfig from environment variables.
    ///
    /// Environment variables (unset or unparseable values keep the default):
    /// - `TSLSUITE_OCSP_RESPONDER_URI` (default: http://localhost:8083)
    /// - `TSLSUITE_TSL_PROVIDER_URI` (default: http://localhost:8084)
    /// - `TSLSUITE_SEQ_NR_FILE` (default: ./tsl-seq-nr.txt)
    /// - `TSLSUITE_TSL_DOWNLOAD_INTERVAL_SECS` (default: 60)
    /// - `TSLSUITE_TSL_PROCESSING_TIME_SECS` (default: 3)
    /// - `TSLSUITE_OCSP_PROCESSING_TIME_SECS` (default: 1)
    /// - `TSLSUITE_POLL_INTERVAL_MS` (default: 500)
    /// - `TSLSUITE_HTTP_TIMEOUT_SECS` (default: 10)
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            ocsp_responder_uri: std::env::var("TSLSUITE_OCSP_RESPONDER_URI")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(default.ocsp_responder_uri),
            tsl_provider_uri: std::env::var("TSLSUITE_TSL_PROVIDER_URI")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(default.tsl_provider_uri),
            seq_nr_file: std::env::var("TSLSUITE_SEQ_NR_FILE")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(default.seq_nr_file),
            tsl_download_interval_secs: env_parse("TSLSUITE_TSL_DOWNLOAD_INTERVAL_SECS")
                .unwrap_or(default.tsl_download_interval_secs),
            tsl_processing_time_secs: env_parse("TSLSUITE_TSL_PROCESSING_TIME_SECS")
                .unwrap_or(default.tsl_processing_time_secs),
            ocsp_processing_time_secs: env_parse("TSLSUITE_OCSP_PROCESSING_TIME_SECS")
                .unwrap_or(default.ocsp_processing_time_secs),
            poll_interval: env_parse("TSLSUITE_POLL_INTERVAL_MS")
                .map(Duration::from_millis)
                .unwrap_or(default.poll_interval),
            http_timeout_secs: env_parse("TSLSUITE_HTTP_TIMEOUT_SECS")
                .unwrap_or(default.http_timeout_secs),
        }
    }
}

fn env_parse(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
