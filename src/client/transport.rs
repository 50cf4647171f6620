use super::error::AttemptError;
use super::payload::GenerateRequest;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Raw HTTP reply from the relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayReply {
    pub status: u16,
    pub body: String,
}

/// Delivers one request to the relay. Only connectivity failures are errors;
/// HTTP statuses are interpreted by the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &GenerateRequest) -> Result<RelayReply, AttemptError>;
}

/// `reqwest`-backed transport posting JSON to a fixed endpoint
pub struct HttpTransport {
    client: Client,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(endpoint: Url, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &GenerateRequest) -> Result<RelayReply, AttemptError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| AttemptError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| AttemptError::Network(e.to_string()))?;

        Ok(RelayReply { status, body })
    }
}
