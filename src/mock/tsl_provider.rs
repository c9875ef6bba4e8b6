use std::sync::{Arc, PoisonError, RwLock};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode, Version};
use axum::response::{IntoResponse, Response};
use axum::Json;
use sha2::{Digest, Sha256};

use crate::contracts::{
    TslDownloadPoint, TslHistoryQuery, TslProviderConfig, TslRequestHistoryEntry,
};
use crate::mock::history::HistoryStore;
use crate::mock::{parse_optional_config, ApiError};

pub const XML_PRIMARY_PATH: &str = "/tsl/download/ECC-RSA_TSL-test.xml";
pub const HASH_PRIMARY_PATH: &str = "/tsl/download/ECC-RSA_TSL-test.sha2";
pub const XML_BACKUP_PATH: &str = "/tsl-backup/download/ECC-RSA_TSL-test.xml";
pub const HASH_BACKUP_PATH: &str = "/tsl-backup/download/ECC-RSA_TSL-test.sha2";

/// Route path serving `point`.
pub fn download_path(point: TslDownloadPoint) -> &'static str {
    match point {
        TslDownloadPoint::XmlPrimary => XML_PRIMARY_PATH,
        TslDownloadPoint::XmlBackup => XML_BACKUP_PATH,
        TslDownloadPoint::HashPrimary => HASH_PRIMARY_PATH,
        TslDownloadPoint::HashBackup => HASH_BACKUP_PATH,
    }
}

/// State of the in-process mock TSL provider.
#[derive(Default)]
pub struct TslProviderState {
    config: RwLock<Option<TslProviderConfig>>,
    history: HistoryStore<TslRequestHistoryEntry>,
}

impl TslProviderState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> Option<TslProviderConfig> {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn history(&self) -> &HistoryStore<TslRequestHistoryEntry> {
        &self.history
    }

    fn set_config(&self, config: Option<TslProviderConfig>) {
        if config.is_none() {
            self.history.clear();
        }
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
    }
}

/// POST /config
/// Offers a TSL; an empty or `null` body clears configuration and history.
pub async fn configure(
    State(state): State<Arc<TslProviderState>>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let config: Option<TslProviderConfig> = parse_optional_config(&body)?;
    match &config {
        Some(c) => tracing::info!(
            seq_nr = c.tsl_seq_nr,
            tsl_bytes = c.tsl_bytes.len(),
            "TSL provider configured"
        ),
        None => tracing::info!("TSL provider cleared"),
    }
    state.set_config(config);
    Ok(StatusCode::OK)
}

/// POST /info
pub async fn info(
    State(state): State<Arc<TslProviderState>>,
    Json(query): Json<TslHistoryQuery>,
) -> Json<Vec<TslRequestHistoryEntry>> {
    let entries = state
        .history
        .query(|e| query.matches(e), query.history_delete_option);
    Json(entries)
}

/// GET on one of the four download routes.
///
/// Records the download, then answers with the configured status code. XML
/// routes serve the TSL, hash routes its hex SHA-256. Without an offered TSL
/// the route answers 404 and records nothing.
pub async fn download(
    state: Arc<TslProviderState>,
    point: TslDownloadPoint,
    headers: HeaderMap,
    version: Version,
) -> Response {
    let Some(config) = state.config() else {
        return ApiError::NotFound("no TSL offered".into()).into_response();
    };

    let was_compressed = headers
        .get(header::ACCEPT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("gzip"))
        .unwrap_or(false);

    state.history.record(TslRequestHistoryEntry {
        tsl_seq_nr: config.tsl_seq_nr,
        endpoint: point,
        was_compressed,
        protocol: format!("{:?}", version),
    });
    tracing::debug!(seq_nr = config.tsl_seq_nr, endpoint = ?point, "TSL download served");

    let status = StatusCode::from_u16(config.status_for(point))
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status != StatusCode::OK {
        return status.into_response();
    }

    if point.is_xml() {
        (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/xml")],
            config.tsl_bytes,
        )
            .into_response()
    } else {
        let digest = hex::encode(Sha256::digest(&config.tsl_bytes));
        (StatusCode::OK, [(header::CONTENT_TYPE, "text/plain")], digest).into_response()
    }
}
