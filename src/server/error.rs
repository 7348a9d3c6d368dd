//! HTTP error responses.
//!
//! Every response body has a `detail` string. Unusable model replies also
//! carry `rawResponse` so the caller can see what the model said.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use plancoach_error_redaction::redact_known_secrets;
use plancoach_orchestrator::OrchestratorError;
use plancoach_utils::error::{ParseError, ParseErrorKind, ProviderError};
use serde::Serialize;

pub const UNAUTHORIZED_DETAIL: &str =
    "Invalid or missing API key. Send it in the X-API-Key header or the api_key query parameter.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
    pub raw_response: Option<String>,
}

impl ApiError {
    fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
            raw_response: None,
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::FORBIDDEN, UNAUTHORIZED_DETAIL)
    }

    pub fn unprocessable(rejection: &JsonRejection) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("Invalid request body: {}", rejection.body_text()),
        )
    }

    pub fn provider(err: &ProviderError) -> Self {
        match err {
            ProviderError::Timeout { .. } => {
                Self::new(StatusCode::GATEWAY_TIMEOUT, format!("LLM request timed out: {err}"))
            }
            ProviderError::Transport { .. } => {
                Self::new(StatusCode::BAD_GATEWAY, format!("LLM provider error: {err}"))
            }
            ProviderError::MissingCredential { .. } | ProviderError::Misconfiguration(_) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("LLM provider is not configured: {err}"),
            ),
        }
    }

    pub fn parse(err: &ParseError) -> Self {
        let detail = match err.kind {
            ParseErrorKind::EmptyOrUnstructured => {
                format!("LLM reply could not be parsed into an advisory: {}", err.message)
            }
            ParseErrorKind::EmptyReply => "LLM returned an empty reply".to_string(),
        };
        Self {
            status: StatusCode::BAD_GATEWAY,
            detail,
            raw_response: Some(err.raw_text.clone()),
        }
    }

    /// Scrub configured secrets and generic credential patterns.
    #[must_use]
    pub fn redacted<S: AsRef<str>>(mut self, secrets: &[S]) -> Self {
        let scrub = |text: &str| redact_known_secrets(text, secrets);
        self.detail = scrub(&self.detail);
        self.raw_response = self.raw_response.as_deref().map(scrub);
        self
    }
}

impl From<&OrchestratorError> for ApiError {
    fn from(err: &OrchestratorError) -> Self {
        match err {
            OrchestratorError::Provider(e) => Self::provider(e),
            OrchestratorError::Parse(e) => Self::parse(e),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.status.as_u16(), self.detail)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            detail: self.detail,
            raw_response: self.raw_response,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_status_mapping() {
        let timeout = ProviderError::Timeout {
            provider: "deepseek".to_string(),
            duration: Duration::from_secs(60),
        };
        let err = ApiError::provider(&timeout);
        assert_eq!(err.status, StatusCode::GATEWAY_TIMEOUT);
        assert!(err.detail.contains("timed out after 60s"));

        let transport = ProviderError::Transport {
            provider: "openai".to_string(),
            status: Some(429),
            message: "Too Many Requests".to_string(),
            body: None,
        };
        let err = ApiError::provider(&transport);
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
        assert!(err.detail.contains("429"));

        let missing = ProviderError::MissingCredential {
            provider: "anthropic".to_string(),
        };
        assert_eq!(ApiError::provider(&missing).status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_parse_errors_are_distinct_from_transport() {
        let err = ApiError::parse(&ParseError::unstructured("no JSON object found in reply", "just prose"));
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
        assert!(err.detail.contains("could not be parsed"));
        assert_eq!(err.raw_response.as_deref(), Some("just prose"));

        let err = ApiError::parse(&ParseError::empty_reply(""));
        assert_eq!(err.detail, "LLM returned an empty reply");
    }

    #[test]
    fn test_redaction_covers_detail_and_raw_reply() {
        let err = ApiError::parse(&ParseError::unstructured(
            "model echoed inbound-key-123",
            "raw with provider-secret-xyz",
        ))
        .redacted(&["inbound-key-123", "provider-secret-xyz"]);

        assert!(!err.detail.contains("inbound-key-123"));
        assert!(!err.raw_response.unwrap().contains("provider-secret-xyz"));
    }
}
