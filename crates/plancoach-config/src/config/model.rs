use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use plancoach_utils::types::{ConfigSource, ProviderKind};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8001;
pub const DEFAULT_PROVIDER: ProviderKind = ProviderKind::DeepSeek;
pub const DEFAULT_MAX_TOKENS: u32 = 2000;
pub const DEFAULT_QUICK_MAX_TOKENS: u32 = 500;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Resolved configuration for one plancoach process.
///
/// Built once at startup by [`Config::discover`] or [`Config::builder`],
/// then shared read-only.
///
/// # Configuration File Format
///
/// ```toml
/// [server]
/// host = "0.0.0.0"
/// port = 8001
///
/// [provider]
/// name = "ollama"
/// model = "qwen2.5:14b"
/// timeout_secs = 180
///
/// [access]
/// api_keys = ["frontend-key", "ops-key"]
///
/// [logging]
/// json = true
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub provider: ProviderConfig,
    pub access: AccessConfig,
    pub logging: LoggingConfig,
    /// Source attribution for each setting (for `plancoach config`).
    pub source_attribution: HashMap<String, ConfigSource>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Which backend to call and how.
#[derive(Clone, PartialEq)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub model: String,
    /// API root without the endpoint path, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    /// Token limit for full analyses.
    pub max_tokens: u32,
    /// Token limit for quick advice.
    pub quick_max_tokens: u32,
    pub temperature: f32,
}

impl ProviderConfig {
    /// Defaults for `kind` with no credential.
    #[must_use]
    pub fn for_kind(kind: ProviderKind) -> Self {
        Self {
            kind,
            model: kind.default_model().to_string(),
            base_url: kind.default_base_url().to_string(),
            api_key: None,
            timeout: Duration::from_secs(kind.default_timeout_secs()),
            max_tokens: DEFAULT_MAX_TOKENS,
            quick_max_tokens: DEFAULT_QUICK_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// A credential is present, or the provider does not need one.
    #[must_use]
    pub fn has_usable_credential(&self) -> bool {
        !self.kind.requires_credential()
            || self
                .api_key
                .as_deref()
                .is_some_and(|key| !key.trim().is_empty())
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("kind", &self.kind)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("max_tokens", &self.max_tokens)
            .field("quick_max_tokens", &self.quick_max_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

/// Keys accepted by the access gate.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AccessConfig {
    pub api_keys: Vec<String>,
}

impl fmt::Debug for AccessConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessConfig")
            .field("api_keys", &format_args!("<{} redacted>", self.api_keys.len()))
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoggingConfig {
    pub verbose: bool,
    pub json: bool,
}

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TomlConfig {
    pub server: Option<TomlServer>,
    pub provider: Option<TomlProvider>,
    pub access: Option<TomlAccess>,
    pub logging: Option<TomlLogging>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TomlServer {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TomlProvider {
    pub name: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_tokens: Option<u32>,
    pub quick_max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TomlAccess {
    pub api_keys: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TomlLogging {
    pub verbose: Option<bool>,
    pub json: Option<bool>,
}
