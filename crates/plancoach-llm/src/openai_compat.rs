//! OpenAI chat-completions backend
//!
//! Serves `openai`, `deepseek` and `ollama`, which all accept
//! `POST {base}/chat/completions`. Ollama runs without a key and is sent
//! `stream: false` explicitly.

use crate::http_client::HttpClient;
use crate::types::{ProviderClient, RawCompletion, TokenUsage, system_prompt};
use async_trait::async_trait;
use plancoach_config::ProviderConfig;
use plancoach_utils::error::ProviderError;
use plancoach_utils::types::ProviderKind;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub(crate) struct OpenAiCompatClient {
    http: HttpClient,
    kind: ProviderKind,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    system: String,
}

impl OpenAiCompatClient {
    /// # Errors
    ///
    /// Returns `ProviderError::Misconfiguration` if the HTTP client cannot be built.
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string);

        Ok(Self {
            http: HttpClient::new(config.kind, config.timeout, api_key.as_deref())?,
            kind: config.kind,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            system: system_prompt(config.kind),
        })
    }

    fn request_body<'a>(&'a self, prompt: &'a str, max_tokens: u32) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &self.system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens,
            temperature: self.temperature,
            stream: (self.kind == ProviderKind::Ollama).then_some(false),
        }
    }
}

#[async_trait]
impl ProviderClient for OpenAiCompatClient {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<RawCompletion, ProviderError> {
        debug!(
            provider = %self.kind,
            model = %self.model,
            max_tokens,
            prompt_chars = prompt.len(),
            "Invoking chat-completions backend"
        );

        let mut request = self.http.post(&self.endpoint).json(&self.request_body(prompt, max_tokens));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = self.http.send(request).await?;
        let body: ChatResponse = self.http.decode(response).await?;

        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| self.http.malformed("response missing choices[0]"))?;

        let mut completion = RawCompletion::new(
            choice.message.content.unwrap_or_default(),
            self.kind,
            body.model.unwrap_or_else(|| self.model.clone()),
        );
        completion.reasoning = choice
            .message
            .reasoning_content
            .filter(|r| !r.trim().is_empty());
        completion.usage = body.usage.map(|u| TokenUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        });

        debug!(
            provider = %self.kind,
            tokens_input = ?completion.usage.and_then(|u| u.input_tokens),
            tokens_output = ?completion.usage.and_then(|u| u.output_tokens),
            has_reasoning = completion.reasoning.is_some(),
            "Chat-completions invocation completed"
        );

        Ok(completion)
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    model: Option<String>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    reasoning_content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: Option<u64>,
    completion_tokens: Option<u64>,
}
