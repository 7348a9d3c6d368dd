use std::collections::BTreeMap;

use super::{Config, ConfigSource};

const MASK: &str = "********";

impl Config {
    /// Effective configuration as `key -> (value, source)`, sorted by key.
    ///
    /// Secrets are masked: the provider key shows as `********` and client
    /// keys as a count.
    #[must_use]
    pub fn effective_config(&self) -> BTreeMap<String, (String, String)> {
        let mut entries = BTreeMap::new();
        let mut add = |key: &str, value: String| {
            let source = self
                .source_attribution
                .get(key)
                .copied()
                .unwrap_or(ConfigSource::Default);
            entries.insert(key.to_string(), (value, source.as_str().to_string()));
        };

        let provider = &self.provider;
        add("provider.name", provider.kind.as_str().to_string());
        add("provider.model", provider.model.clone());
        add("provider.base_url", provider.base_url.clone());
        add(
            "provider.api_key",
            match &provider.api_key {
                Some(_) => MASK.to_string(),
                None => "(unset)".to_string(),
            },
        );
        add(
            "provider.timeout_secs",
            provider.timeout.as_secs().to_string(),
        );
        add("provider.max_tokens", provider.max_tokens.to_string());
        add(
            "provider.quick_max_tokens",
            provider.quick_max_tokens.to_string(),
        );
        add("provider.temperature", provider.temperature.to_string());
        add("server.host", self.server.host.clone());
        add("server.port", self.server.port.to_string());
        add(
            "access.api_keys",
            format!("{} configured", self.access.api_keys.len()),
        );
        add("logging.verbose", self.logging.verbose.to_string());
        add("logging.json", self.logging.json.to_string());

        entries
    }
}
