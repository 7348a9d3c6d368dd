//! Anthropic Messages API backend

use crate::http_client::HttpClient;
use crate::types::{ProviderClient, RawCompletion, TokenUsage, system_prompt};
use async_trait::async_trait;
use plancoach_config::ProviderConfig;
use plancoach_utils::error::ProviderError;
use plancoach_utils::types::ProviderKind;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Anthropic API version header value
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub(crate) struct AnthropicClient {
    http: HttpClient,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    system: String,
}

impl AnthropicClient {
    /// # Errors
    ///
    /// `MissingCredential` without a key, `Misconfiguration` if the HTTP
    /// client cannot be built.
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ProviderError::MissingCredential {
                provider: ProviderKind::Anthropic.to_string(),
            })?
            .to_string();

        Ok(Self {
            http: HttpClient::new(ProviderKind::Anthropic, config.timeout, Some(&api_key))?,
            endpoint: format!("{}/messages", config.base_url.trim_end_matches('/')),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            system: system_prompt(ProviderKind::Anthropic),
        })
    }

    fn request_body<'a>(&'a self, prompt: &'a str, max_tokens: u32) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &self.model,
            system: &self.system,
            messages: [UserMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens,
            temperature: self.temperature,
        }
    }
}

#[async_trait]
impl ProviderClient for AnthropicClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<RawCompletion, ProviderError> {
        debug!(
            provider = "anthropic",
            model = %self.model,
            max_tokens,
            prompt_chars = prompt.len(),
            "Invoking Anthropic backend"
        );

        let request = self
            .http
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&self.request_body(prompt, max_tokens));

        let response = self.http.send(request).await?;
        let body: MessagesResponse = self.http.decode(response).await?;

        let mut text = String::new();
        let mut thinking = Vec::new();
        for block in body.content {
            match block.block_type.as_str() {
                "text" => text.push_str(block.text.as_deref().unwrap_or_default()),
                "thinking" => thinking.extend(block.thinking),
                _ => {}
            }
        }

        let mut completion = RawCompletion::new(
            text,
            ProviderKind::Anthropic,
            body.model.unwrap_or_else(|| self.model.clone()),
        );
        if !thinking.is_empty() {
            completion.reasoning = Some(thinking.join("\n\n"));
        }
        completion.usage = body.usage.map(|u| TokenUsage {
            input_tokens: u.input_tokens,
            output_tokens: u.output_tokens,
        });

        debug!(
            provider = "anthropic",
            tokens_input = ?completion.usage.and_then(|u| u.input_tokens),
            tokens_output = ?completion.usage.and_then(|u| u.output_tokens),
            "Anthropic invocation completed"
        );

        Ok(completion)
    }
}

#[derive(Debug, Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    system: &'a str,
    messages: [UserMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    model: Option<String>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
    thinking: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: Option<u64>,
    output_tokens: Option<u64>,
}
