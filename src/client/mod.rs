//! HTTP clients for the mock OCSP responder and the mock TSL provider.

mod ocsp_responder;
mod tsl_provider;

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

pub use ocsp_responder::OcspResponderClient;
pub use tsl_provider::TslProviderClient;

use crate::config::SuiteConfig;
use crate::contracts::ClientError;

/// Connection settings of one mock service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Base URL (e.g., "http://localhost:8083").
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl ServiceConfig {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs,
        }
    }

    pub fn ocsp_responder(config: &SuiteConfig) -> Self {
        Self::new(&config.ocsp_responder_uri, config.http_timeout_secs)
    }

    pub fn tsl_provider(config: &SuiteConfig) -> Self {
        Self::new(&config.tsl_provider_uri, config.http_timeout_secs)
    }
}

/// Request plumbing shared by both clients. Every call is sent exactly once.
struct ServiceHttp {
    service: &'static str,
    config: ServiceConfig,
    client: reqwest::Client,
}

impl ServiceHttp {
    fn new(service: &'static str, config: ServiceConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;

        Ok(Self {
            service,
            config,
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ClientError> {
        request
            .send()
            .await
            .map_err(|e| ClientError::Transport(format!("{}: {}", self.service, e)))
    }

    fn expect_success(
        &self,
        response: &reqwest::Response,
        operation: &str,
    ) -> Result<(), ClientError> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(ClientError::UnexpectedStatus {
                service: self.service.to_string(),
                operation: operation.to_string(),
                status: response.status().as_u16(),
            })
        }
    }

    async fn health(&self) -> Result<(), ClientError> {
        let response = self.send(self.client.get(self.url("/actuator/health"))).await?;
        if !response.status().is_success() {
            return Err(ClientError::HealthCheck {
                service: self.service.to_string(),
                status: response.status().as_u16(),
            });
        }
        tracing::debug!(service = self.service, "Health check passed");
        Ok(())
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, ClientError> {
        let response = self
            .send(self.client.post(self.url(path)).json(body))
            .await?;
        self.expect_success(&response, &format!("POST {}", path))?;
        Ok(response)
    }

    async fn delete(&self, path: &str) -> Result<(), ClientError> {
        let response = self.send(self.client.delete(self.url(path))).await?;
        self.expect_success(&response, &format!("DELETE {}", path))
    }

    async fn query<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, ClientError> {
        self.post_json(path, body)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::Decode(format!("{}: {}", self.service, e)))
    }
}
