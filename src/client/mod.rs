//! Client for the model relay.
//!
//! A call is one logical model invocation: it is retried with exponential
//! backoff on any failure and settles either with the model's text or with a
//! classified [`CallError`]. Callers never see the individual attempts.

mod error;
mod payload;
mod retry;
mod transport;

pub use error::{AttemptError, CallError, CallErrorKind, CallResult, display_text};
pub use payload::{Content, GenerateRequest, Part, RelayResponse};
pub use retry::RetryPolicy;
pub use transport::{HttpTransport, RelayReply, Transport};

use crate::config::ClientConfig;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio_retry::Retry;
use tokio_util::sync::CancellationToken;

/// Timeout for a single attempt when none is configured
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(60);

/// Longest slice of an error body kept for diagnostics
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Anything that can settle a model request
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn call(&self, request: &GenerateRequest, cancel: &CancellationToken) -> CallResult;
}

/// Retrying client over a [`Transport`]
pub struct ApiClient<T = HttpTransport> {
    transport: T,
    policy: RetryPolicy,
    attempt_timeout: Duration,
}

impl ApiClient<HttpTransport> {
    /// Build an HTTP client from the process configuration
    pub fn from_config(config: &ClientConfig) -> anyhow::Result<Self> {
        let transport = HttpTransport::new(config.endpoint_url()?, config.request_timeout())?;
        Ok(Self::new(transport, config.retry_policy()).with_attempt_timeout(config.request_timeout()))
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self {
            transport,
            policy,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Call without a cancellation source
    pub async fn call_once(&self, request: &GenerateRequest) -> CallResult {
        self.call_with_cancel(request, &CancellationToken::new()).await
    }

    /// Run the retry loop until success, exhaustion, or cancellation.
    /// Cancellation interrupts both an in-flight attempt and a backoff sleep.
    pub async fn call_with_cancel(
        &self,
        request: &GenerateRequest,
        cancel: &CancellationToken,
    ) -> CallResult {
        let attempts = AtomicU32::new(0);
        let max_attempts = self.policy.max_attempts;

        let action = || {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                self.attempt(request).await.inspect_err(|error| {
                    if attempt < max_attempts {
                        tracing::warn!(
                            attempt,
                            max_attempts,
                            error = %error,
                            "Model call failed, retrying"
                        );
                    }
                })
            }
        };

        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            result = Retry::spawn(self.policy.delays(), action) => Some(result),
        };

        let attempts = attempts.load(Ordering::SeqCst);
        match outcome {
            Some(Ok(text)) => {
                tracing::debug!(attempts, "Model call succeeded");
                Ok(text)
            }
            Some(Err(last)) => {
                let error = CallError::exhausted(&last, attempts);
                tracing::error!(
                    attempts,
                    kind = %error.kind,
                    detail = %error.detail,
                    "Model call failed after all attempts"
                );
                Err(error)
            }
            None => {
                tracing::debug!(attempts, "Model call cancelled");
                Err(CallError::cancelled(attempts))
            }
        }
    }

    /// One attempt: send, check status, extract `text`
    async fn attempt(&self, request: &GenerateRequest) -> Result<String, AttemptError> {
        let reply = tokio::time::timeout(self.attempt_timeout, self.transport.send(request))
            .await
            .map_err(|_| AttemptError::Timeout(self.attempt_timeout.as_secs()))??;

        if !(200..300).contains(&reply.status) {
            return Err(AttemptError::Status {
                status: reply.status,
                body: reply.body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let parsed: RelayResponse = serde_json::from_str(&reply.body)
            .map_err(|e| AttemptError::Malformed(format!("invalid JSON: {e}")))?;

        match parsed.text {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(AttemptError::Malformed(
                "response has no text field".to_string(),
            )),
        }
    }
}

#[async_trait]
impl<T: Transport> ModelClient for ApiClient<T> {
    async fn call(&self, request: &GenerateRequest, cancel: &CancellationToken) -> CallResult {
        self.call_with_cancel(request, cancel).await
    }
}
