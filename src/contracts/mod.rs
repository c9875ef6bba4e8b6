pub mod error;
pub mod expectation;
pub mod history;
pub mod mock_service;

pub use error::{ClientError, SequenceError, SuiteError};
pub use expectation::ExpectationBehavior;
pub use history::{
    DownloadEndpointSet, HistoryDeleteOption, Match, OcspHistoryQuery, OcspRequestHistoryEntry,
    TslDownloadPoint, TslHistoryQuery, TslRequestHistoryEntry, MATCH_ANY_SENTINEL,
};
pub use mock_service::{
    CertificateStatus, OcspResponderApi, OcspResponderConfig, TslProviderApi, TslProviderConfig,
};
