use async_trait::async_trait;
use serde::Serialize;

use plancoach_utils::error::ProviderError;
use plancoach_utils::types::ProviderKind;

/// System message sent ahead of every prompt.
pub const SYSTEM_PROMPT: &str = "You are an expert in constraint programming and optimization.";

/// Extra instruction for local models, which drift from JSON more often.
const LOCAL_JSON_HINT: &str = "Provide clear, structured analysis in JSON format when requested.";

/// System message for `kind`.
#[must_use]
pub fn system_prompt(kind: ProviderKind) -> String {
    match kind {
        ProviderKind::Ollama => format!("{SYSTEM_PROMPT} {LOCAL_JSON_HINT}"),
        _ => SYSTEM_PROMPT.to_string(),
    }
}

/// Token counts reported by the backend, when it reports them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TokenUsage {
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
}

/// A backend reply, normalized across wire shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCompletion {
    /// Assistant text, untouched.
    pub text: String,
    /// Separate reasoning channel (DeepSeek `reasoning_content`, Anthropic thinking blocks).
    pub reasoning: Option<String>,
    pub usage: Option<TokenUsage>,
    pub provider: ProviderKind,
    pub model: String,
}

impl RawCompletion {
    #[must_use]
    pub fn new(text: impl Into<String>, provider: ProviderKind, model: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            reasoning: None,
            usage: None,
            provider,
            model: model.into(),
        }
    }

    #[must_use]
    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }
}

/// A text-generation backend.
///
/// One instance is built from configuration at startup and shared behind an
/// `Arc` by every request. Implementations make exactly one outbound call per
/// `generate` and never retry.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn model(&self) -> &str;

    /// Send `prompt` and return the reply.
    ///
    /// # Errors
    ///
    /// - `ProviderError::Timeout` when the configured timeout expires
    /// - `ProviderError::Transport` for network failures, non-2xx replies and
    ///   undecodable bodies
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<RawCompletion, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_local_adds_json_hint() {
        let local = system_prompt(ProviderKind::Ollama);
        assert!(local.starts_with(SYSTEM_PROMPT));
        assert!(local.ends_with("JSON format when requested."));

        assert_eq!(system_prompt(ProviderKind::DeepSeek), SYSTEM_PROMPT);
        assert_eq!(system_prompt(ProviderKind::Anthropic), SYSTEM_PROMPT);
    }

    #[test]
    fn test_completion_builder() {
        let completion =
            RawCompletion::new("{}", ProviderKind::DeepSeek, "deepseek-reasoner").with_reasoning("think");
        assert_eq!(completion.reasoning.as_deref(), Some("think"));
        assert!(completion.usage.is_none());
    }
}
