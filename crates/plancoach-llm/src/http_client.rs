//! Shared HTTP plumbing for the provider backends
//!
//! One `reqwest::Client` per backend, built once at startup. Every call gets
//! a single attempt bounded by the configured timeout. Error bodies are
//! redacted and truncated before they leave this module.

use plancoach_error_redaction::redact_known_secrets;
use plancoach_utils::error::ProviderError;
use plancoach_utils::types::ProviderKind;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound on the error body kept for callers.
pub(crate) const MAX_ERROR_BODY_CHARS: usize = 2000;

#[derive(Clone)]
pub(crate) struct HttpClient {
    client: Client,
    provider: ProviderKind,
    timeout: Duration,
    /// Values scrubbed from every error body and message.
    secrets: Vec<String>,
}

impl HttpClient {
    /// # Errors
    ///
    /// Returns `ProviderError::Misconfiguration` if the client cannot be built.
    pub fn new(
        provider: ProviderKind,
        timeout: Duration,
        secret: Option<&str>,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| {
                ProviderError::Misconfiguration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            provider,
            timeout,
            secrets: secret
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .into_iter()
                .collect(),
        })
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.client.post(url).timeout(self.timeout)
    }

    /// Send `request` once and return the 2xx response.
    ///
    /// # Errors
    ///
    /// `Timeout` when the deadline passes, `Transport` for network failures
    /// and non-2xx replies.
    pub async fn send(&self, request: RequestBuilder) -> Result<Response, ProviderError> {
        debug!(
            provider = %self.provider,
            timeout_secs = self.timeout.as_secs(),
            "Executing provider request"
        );

        let response = request.send().await.map_err(|e| self.map_reqwest_error(&e))?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let body = self.scrub(&body);
        let message = upstream_error_message(&body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());

        warn!(
            provider = %self.provider,
            status = status.as_u16(),
            "Provider returned non-success status"
        );

        Err(ProviderError::Transport {
            provider: self.provider.to_string(),
            status: Some(status.as_u16()),
            message,
            body: (!body.is_empty()).then(|| truncate(&body, MAX_ERROR_BODY_CHARS)),
        })
    }

    /// Decode a 2xx body as `T`.
    ///
    /// # Errors
    ///
    /// `Transport` carrying the status and the (scrubbed) body when decoding fails.
    pub async fn decode<T: DeserializeOwned>(&self, response: Response) -> Result<T, ProviderError> {
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.map_reqwest_error(&e))?;

        serde_json::from_str(&body).map_err(|e| ProviderError::Transport {
            provider: self.provider.to_string(),
            status: Some(status),
            message: format!("undecodable response body: {e}"),
            body: Some(truncate(&self.scrub(&body), MAX_ERROR_BODY_CHARS)),
        })
    }

    pub fn malformed(&self, message: impl Into<String>) -> ProviderError {
        ProviderError::Transport {
            provider: self.provider.to_string(),
            status: Some(200),
            message: message.into(),
            body: None,
        }
    }

    fn map_reqwest_error(&self, error: &reqwest::Error) -> ProviderError {
        if error.is_timeout() {
            return ProviderError::Timeout {
                provider: self.provider.to_string(),
                duration: self.timeout,
            };
        }
        ProviderError::Transport {
            provider: self.provider.to_string(),
            status: error.status().map(|s| s.as_u16()),
            message: self.scrub(&error.to_string()),
            body: None,
        }
    }

    fn scrub(&self, text: &str) -> String {
        redact_known_secrets(text, &self.secrets)
    }
}

/// `error.message` (OpenAI, Anthropic) or a top-level `error` string (Ollama).
fn upstream_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    error
        .get("message")
        .and_then(|m| m.as_str())
        .or_else(|| error.as_str())
        .map(str::to_string)
}

pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...[truncated]", &text[..cut]),
        None => text.to_string(),
    }
}
