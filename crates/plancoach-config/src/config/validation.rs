use super::{Config, ConfigError};

const MAX_TIMEOUT_SECS: u64 = 600;
const MAX_TOKEN_LIMIT: u32 = 32_000;

fn invalid(key: &str, value: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.into(),
    }
}

impl Config {
    /// Validate configuration values.
    ///
    /// Returns the first violation found. Credentials are not checked here:
    /// a server may start without a provider key and report itself as
    /// unconfigured.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let provider = &self.provider;

        let timeout_secs = provider.timeout.as_secs();
        if timeout_secs == 0 {
            return Err(invalid(
                "provider.timeout_secs",
                "must be at least 1 second",
            ));
        }
        if timeout_secs > MAX_TIMEOUT_SECS {
            return Err(invalid(
                "provider.timeout_secs",
                format!("exceeds maximum limit of {MAX_TIMEOUT_SECS} seconds"),
            ));
        }

        for (key, value) in [
            ("provider.max_tokens", provider.max_tokens),
            ("provider.quick_max_tokens", provider.quick_max_tokens),
        ] {
            if value == 0 {
                return Err(invalid(key, "must be greater than 0"));
            }
            if value > MAX_TOKEN_LIMIT {
                return Err(invalid(
                    key,
                    format!("exceeds maximum limit of {MAX_TOKEN_LIMIT}"),
                ));
            }
        }

        if !(0.0..=2.0).contains(&provider.temperature) {
            return Err(invalid(
                "provider.temperature",
                format!("{} is outside 0.0..=2.0", provider.temperature),
            ));
        }

        if provider.model.trim().is_empty() {
            return Err(invalid("provider.model", "must not be empty"));
        }

        let url = provider.base_url.as_str();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(invalid(
                "provider.base_url",
                format!("'{url}' must start with http:// or https://"),
            ));
        }

        if self.server.port == 0 {
            return Err(invalid("server.port", "must be greater than 0"));
        }
        if self.server.host.trim().is_empty() {
            return Err(invalid("server.host", "must not be empty"));
        }

        Ok(())
    }

    /// Require at least one client API key.
    ///
    /// The server refuses to start without one, since an empty key set
    /// rejects every request.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingRequired("access.api_keys")` when no
    /// non-blank key is configured.
    pub fn require_access_keys(&self) -> Result<(), ConfigError> {
        if self.access.api_keys.iter().any(|k| !k.trim().is_empty()) {
            Ok(())
        } else {
            Err(ConfigError::MissingRequired("access.api_keys".to_string()))
        }
    }
}
