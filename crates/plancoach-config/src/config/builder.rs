use std::collections::HashMap;
use std::time::Duration;

use super::{
    AccessConfig, Config, ConfigError, ConfigSource, LoggingConfig, ProviderConfig, ProviderKind,
    ServerConfig,
    model::DEFAULT_PROVIDER,
};

impl Config {
    /// Create a builder for programmatic configuration.
    ///
    /// Use this to embed plancoach without reading the environment or a
    /// config file.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use plancoach_config::{Config, ProviderKind};
    /// use std::time::Duration;
    ///
    /// let config = Config::builder()
    ///     .provider(ProviderKind::Ollama)
    ///     .model("qwen2.5:14b")
    ///     .timeout(Duration::from_secs(180))
    ///     .access_key("frontend-key")
    ///     .build()
    ///     .expect("Failed to build config");
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Builder for programmatic configuration.
///
/// Provider defaults (model, base URL, timeout) follow the selected
/// [`ProviderKind`] unless set explicitly. Every value set through the
/// builder is attributed to `ConfigSource::Programmatic`.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    kind: Option<ProviderKind>,
    model: Option<String>,
    base_url: Option<String>,
    api_key: Option<String>,
    timeout: Option<Duration>,
    max_tokens: Option<u32>,
    quick_max_tokens: Option<u32>,
    temperature: Option<f32>,
    host: Option<String>,
    port: Option<u16>,
    access_keys: Vec<String>,
    verbose: Option<bool>,
    json: Option<bool>,
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn provider(mut self, kind: ProviderKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    #[must_use]
    pub fn quick_max_tokens(mut self, tokens: u32) -> Self {
        self.quick_max_tokens = Some(tokens);
        self
    }

    #[must_use]
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Add one client key accepted by the access gate.
    #[must_use]
    pub fn access_key(mut self, key: impl Into<String>) -> Self {
        self.access_keys.push(key.into());
        self
    }

    #[must_use]
    pub fn access_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.access_keys.extend(keys.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    #[must_use]
    pub fn json_logs(mut self, json: bool) -> Self {
        self.json = Some(json);
        self
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is out of range.
    pub fn build(self) -> Result<Config, ConfigError> {
        let mut source_attribution = HashMap::new();
        let mut mark = |key: &str, set: bool| {
            let source = if set {
                ConfigSource::Programmatic
            } else {
                ConfigSource::Default
            };
            source_attribution.insert(key.to_string(), source);
        };

        mark("provider.name", self.kind.is_some());
        mark("provider.model", self.model.is_some());
        mark("provider.base_url", self.base_url.is_some());
        mark("provider.timeout_secs", self.timeout.is_some());
        mark("provider.max_tokens", self.max_tokens.is_some());
        mark("provider.quick_max_tokens", self.quick_max_tokens.is_some());
        mark("provider.temperature", self.temperature.is_some());
        mark("server.host", self.host.is_some());
        mark("server.port", self.port.is_some());
        mark("access.api_keys", !self.access_keys.is_empty());
        mark("logging.verbose", self.verbose.is_some());
        mark("logging.json", self.json.is_some());
        if self.api_key.is_some() {
            mark("provider.api_key", true);
        }

        let mut provider = ProviderConfig::for_kind(self.kind.unwrap_or(DEFAULT_PROVIDER));
        if let Some(model) = self.model {
            provider.model = model;
        }
        if let Some(url) = self.base_url {
            provider.base_url = url.trim_end_matches('/').to_string();
        }
        provider.api_key = self.api_key;
        if let Some(timeout) = self.timeout {
            provider.timeout = timeout;
        }
        if let Some(tokens) = self.max_tokens {
            provider.max_tokens = tokens;
        }
        if let Some(tokens) = self.quick_max_tokens {
            provider.quick_max_tokens = tokens;
        }
        if let Some(temperature) = self.temperature {
            provider.temperature = temperature;
        }

        let mut server = ServerConfig::default();
        if let Some(host) = self.host {
            server.host = host;
        }
        if let Some(port) = self.port {
            server.port = port;
        }

        let config = Config {
            server,
            provider,
            access: AccessConfig {
                api_keys: self.access_keys,
            },
            logging: LoggingConfig {
                verbose: self.verbose.unwrap_or(false),
                json: self.json.unwrap_or(false),
            },
            source_attribution,
        };

        config.validate()?;
        Ok(config)
    }
}
