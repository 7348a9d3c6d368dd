//! Scripted backend for tests

use crate::types::{ProviderClient, RawCompletion};
use async_trait::async_trait;
use plancoach_utils::error::ProviderError;
use plancoach_utils::types::ProviderKind;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone)]
enum Script {
    Reply {
        text: String,
        reasoning: Option<String>,
    },
    Fail(ProviderError),
}

/// A `ProviderClient` that returns a fixed reply and counts its calls.
///
/// The call is counted and the prompt recorded before any configured delay,
/// so a caller that times out still sees the attempt.
#[derive(Debug)]
pub struct ScriptedProvider {
    kind: ProviderKind,
    model: String,
    script: Script,
    delay: Option<Duration>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<(String, u32)>>,
}

impl ScriptedProvider {
    fn with_script(script: Script) -> Self {
        Self {
            kind: ProviderKind::Ollama,
            model: "scripted-model".to_string(),
            script,
            delay: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn replying(text: impl Into<String>) -> Self {
        Self::with_script(Script::Reply {
            text: text.into(),
            reasoning: None,
        })
    }

    #[must_use]
    pub fn replying_with_reasoning(text: impl Into<String>, reasoning: impl Into<String>) -> Self {
        Self::with_script(Script::Reply {
            text: text.into(),
            reasoning: Some(reasoning.into()),
        })
    }

    #[must_use]
    pub fn failing(error: ProviderError) -> Self {
        Self::with_script(Script::Fail(error))
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    #[must_use]
    pub fn with_identity(mut self, kind: ProviderKind, model: impl Into<String>) -> Self {
        self.kind = kind;
        self.model = model.into();
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompt and token limit of the most recent call.
    pub fn last_call(&self) -> Option<(String, u32)> {
        self.prompts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .last()
            .cloned()
    }
}

#[async_trait]
impl ProviderClient for ScriptedProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<RawCompletion, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((prompt.to_string(), max_tokens));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.script {
            Script::Reply { text, reasoning } => {
                let mut completion = RawCompletion::new(text.clone(), self.kind, self.model.clone());
                completion.reasoning = reasoning.clone();
                Ok(completion)
            }
            Script::Fail(error) => Err(error.clone()),
        }
    }
}
