use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SuiteError {
    #[error("Evidence '{name}' not observed within {timeout_secs}s")]
    EvidenceTimeout { name: String, timeout_secs: u64 },

    /// A mock service returned history that contradicts the query it answered.
    /// This is a defect in the mock, not in the system under test.
    #[error("Invariant violation in mock service: {0}")]
    InvariantViolation(String),

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Sequence state error: {0}")]
    Sequence(#[from] SequenceError),

    #[error("Mock service error: {0}")]
    Client(#[from] ClientError),
}

impl SuiteError {
    /// Returns true for the poll-timeout variant.
    pub fn is_timeout(&self) -> bool {
        matches!(self, SuiteError::EvidenceTimeout { .. })
    }
}

#[derive(Error, Debug)]
pub enum SequenceError {
    #[error("Sequence number file {} is corrupt: {content:?}", path.display())]
    Corrupt { path: PathBuf, content: String },

    #[error("Failed to persist sequence number: {0}")]
    PersistFailed(String),
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Health check of {service} failed with status {status}")]
    HealthCheck { service: String, status: u16 },

    #[error("{service} answered {operation} with status {status}")]
    UnexpectedStatus {
        service: String,
        operation: String,
        status: u16,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Failed to build HTTP client: {0}")]
    Build(String),
}
