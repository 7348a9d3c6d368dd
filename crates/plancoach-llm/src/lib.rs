//! Provider abstraction for plancoach
//!
//! Every backend implements [`ProviderClient`]. One client is built from
//! configuration at startup with [`from_config`] and shared behind an `Arc`.
//! `ollama`, `deepseek` and `openai` speak the chat-completions shape;
//! `anthropic` speaks the Messages shape.

mod anthropic;
mod catalog;
mod http_client;
mod openai_compat;
mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;

use std::sync::Arc;

pub use catalog::supported_providers;
pub use plancoach_utils::error::ProviderError;
pub use plancoach_utils::types::ProviderKind;
pub use types::{ProviderClient, RawCompletion, SYSTEM_PROMPT, TokenUsage, system_prompt};

use anthropic::AnthropicClient;
use openai_compat::OpenAiCompatClient;
use plancoach_config::ProviderConfig;
use tracing::info;

/// Build the configured backend.
///
/// # Errors
///
/// Returns `ProviderError::MissingCredential` when a remote provider has no
/// API key, or `ProviderError::Misconfiguration` if the HTTP client cannot be
/// built.
pub fn from_config(config: &ProviderConfig) -> Result<Arc<dyn ProviderClient>, ProviderError> {
    if !config.has_usable_credential() {
        return Err(ProviderError::MissingCredential {
            provider: config.kind.to_string(),
        });
    }

    let client: Arc<dyn ProviderClient> = match config.kind {
        ProviderKind::Ollama | ProviderKind::DeepSeek | ProviderKind::OpenAi => {
            Arc::new(OpenAiCompatClient::new(config)?)
        }
        ProviderKind::Anthropic => Arc::new(AnthropicClient::new(config)?),
    };

    info!(
        provider = %config.kind,
        model = %config.model,
        base_url = %config.base_url,
        timeout_secs = config.timeout.as_secs(),
        "Provider client ready"
    );

    Ok(client)
}
