use crate::client::{ServiceConfig, ServiceHttp};
use crate::contracts::{
    ClientError, OcspHistoryQuery, OcspRequestHistoryEntry, OcspResponderApi, OcspResponderConfig,
};

/// Client of the mock OCSP responder.
pub struct OcspResponderClient {
    http: ServiceHttp,
}

impl OcspResponderClient {
    pub fn new(config: ServiceConfig) -> Result<Self, ClientError> {
        Ok(Self {
            http: ServiceHttp::new("OCSP responder", config)?,
        })
    }
}

impl OcspResponderApi for OcspResponderClient {
    async fn health(&self) -> Result<(), ClientError> {
        self.http.health().await
    }

    async fn configure(&self, config: &OcspResponderConfig) -> Result<(), ClientError> {
        self.http.post_json("/config", config).await?;
        tracing::info!(
            cert_serial_nr = %config.cert_serial_nr,
            status = ?config.certificate_status,
            "Configured OCSP responder"
        );
        Ok(())
    }

    async fn clear(&self) -> Result<(), ClientError> {
        self.http.delete("/clear").await?;
        tracing::debug!("Cleared OCSP responder");
        Ok(())
    }

    async fn history(
        &self,
        query: &OcspHistoryQuery,
    ) -> Result<Vec<OcspRequestHistoryEntry>, ClientError> {
        self.http.query("/info", query).await
    }
}
