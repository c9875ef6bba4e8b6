use std::sync::{Arc, PoisonError, RwLock};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::contracts::{OcspHistoryQuery, OcspRequestHistoryEntry, OcspResponderConfig};
use crate::mock::history::HistoryStore;
use crate::mock::{parse_optional_config, ApiError};

/// State of the in-process mock OCSP responder.
#[derive(Default)]
pub struct OcspResponderState {
    config: RwLock<Option<OcspResponderConfig>>,
    history: HistoryStore<OcspRequestHistoryEntry>,
}

impl OcspResponderState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> Option<OcspResponderConfig> {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Appends the history entry for one inbound OCSP request.
    pub fn record_request(
        &self,
        tsl_seq_nr: u64,
        cert_serial_nr: u128,
        request: Vec<u8>,
    ) -> OcspRequestHistoryEntry {
        let entry = OcspRequestHistoryEntry {
            tsl_seq_nr,
            cert_serial_nr,
            timestamp: chrono::Utc::now().to_rfc3339(),
            request,
        };
        self.history.record(entry.clone());
        tracing::debug!(tsl_seq_nr, cert_serial_nr = %cert_serial_nr, "Recorded OCSP request");
        entry
    }

    pub fn history(&self) -> &HistoryStore<OcspRequestHistoryEntry> {
        &self.history
    }

    fn set_config(&self, config: Option<OcspResponderConfig>) {
        if config.is_none() {
            self.history.clear();
        }
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
    }
}

/// POST /config
/// Sets the configuration; an empty or `null` body clears configuration and history.
pub async fn configure(
    State(state): State<Arc<OcspResponderState>>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let config: Option<OcspResponderConfig> = parse_optional_config(&body)?;
    match &config {
        Some(c) => tracing::info!(cert_serial_nr = %c.cert_serial_nr, "OCSP responder configured"),
        None => tracing::info!("OCSP responder cleared"),
    }
    state.set_config(config);
    Ok(StatusCode::OK)
}

/// DELETE /clear
pub async fn clear(State(state): State<Arc<OcspResponderState>>) -> impl IntoResponse {
    state.set_config(None);
    tracing::info!("OCSP responder cleared");
    StatusCode::OK
}

/// POST /info
/// Returns the matching history entries, then applies the delete option.
pub async fn info(
    State(state): State<Arc<OcspResponderState>>,
    Json(query): Json<OcspHistoryQuery>,
) -> Json<Vec<OcspRequestHistoryEntry>> {
    let entries = state
        .history
        .query(|e| query.matches(e), query.history_delete_option);
    Json(entries)
}
