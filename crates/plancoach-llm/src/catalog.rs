use plancoach_utils::types::{ProviderInfo, ProviderKind};
use strum::IntoEnumIterator;

fn entry(kind: ProviderKind) -> ProviderInfo {
    let (models, recommended, cost_hint, description): (&[&str], bool, &str, &str) = match kind {
        ProviderKind::Ollama => (
            &["llama3.1:8b", "qwen2.5:14b", "llama3.1:70b"],
            true,
            "$0",
            "Local LLM running on your server - no API costs, full privacy",
        ),
        ProviderKind::DeepSeek => (
            &["deepseek-reasoner", "deepseek-chat"],
            false,
            "$0.50-1.00 per analysis",
            "DeepSeek reasoning model with chain-of-thought",
        ),
        ProviderKind::OpenAi => (
            &["gpt-4", "gpt-4-turbo", "gpt-3.5-turbo"],
            false,
            "$2.00-5.00 per analysis",
            "OpenAI GPT models",
        ),
        ProviderKind::Anthropic => (
            &["claude-3-opus", "claude-3-sonnet", "claude-3-haiku"],
            false,
            "$1.00-3.00 per analysis",
            "Anthropic Claude models",
        ),
    };

    ProviderInfo {
        name: kind.as_str().to_string(),
        models: models.iter().map(|m| (*m).to_string()).collect(),
        recommended,
        location: kind.location(),
        cost_hint: cost_hint.to_string(),
        description: description.to_string(),
    }
}

/// Static catalog served by `/supported-providers`: local first, then remote.
#[must_use]
pub fn supported_providers() -> Vec<ProviderInfo> {
    ProviderKind::iter().map(entry).collect()
}
