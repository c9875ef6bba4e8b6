use crate::client::{ServiceConfig, ServiceHttp};
use crate::contracts::{
    ClientError, TslHistoryQuery, TslProviderApi, TslProviderConfig, TslRequestHistoryEntry,
};

/// Client of the mock TSL provider.
pub struct TslProviderClient {
    http: ServiceHttp,
}

impl TslProviderClient {
    pub fn new(config: ServiceConfig) -> Result<Self, ClientError> {
        Ok(Self {
            http: ServiceHttp::new("TSL provider", config)?,
        })
    }
}

impl TslProviderApi for TslProviderClient {
    async fn health(&self) -> Result<(), ClientError> {
        self.http.health().await
    }

    async fn configure(&self, config: &TslProviderConfig) -> Result<(), ClientError> {
        self.http.post_json("/config", config).await?;
        tracing::info!(
            seq_nr = config.tsl_seq_nr,
            tsl_bytes = config.tsl_bytes.len(),
            "Configured TSL provider"
        );
        Ok(())
    }

    /// The provider has no dedicated clear route; a null configuration clears it.
    async fn clear(&self) -> Result<(), ClientError> {
        self.http
            .post_json("/config", &serde_json::Value::Null)
            .await?;
        tracing::debug!("Cleared TSL provider");
        Ok(())
    }

    async fn history(
        &self,
        query: &TslHistoryQuery,
    ) -> Result<Vec<TslRequestHistoryEntry>, ClientError> {
        self.http.query("/info", query).await
    }
}
