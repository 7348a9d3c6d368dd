use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use super::model::{
    AccessConfig, Config, DEFAULT_HOST, DEFAULT_MAX_TOKENS, DEFAULT_PORT, DEFAULT_PROVIDER,
    DEFAULT_QUICK_MAX_TOKENS, DEFAULT_TEMPERATURE, LoggingConfig, ProviderConfig, ServerConfig,
    TomlConfig,
};
use super::{CliArgs, ConfigError, ConfigSource, ProviderKind};

/// File looked up in the start directory when no explicit path is given.
pub const CONFIG_FILE_NAME: &str = "plancoach.toml";

/// Snapshot of the environment variables discovery reads.
///
/// Tests build one from pairs instead of mutating the process environment.
/// Blank values count as unset.
#[derive(Debug, Clone, Default)]
pub struct EnvVars {
    vars: HashMap<String, String>,
}

impl EnvVars {
    /// Capture the current process environment. Non-UTF-8 entries are skipped.
    #[must_use]
    pub fn from_process() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        Self { vars }
    }

    #[must_use]
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    fn get_owned(&self, key: &str) -> Option<String> {
        self.get(key).map(str::to_string)
    }

    fn parse<T: FromStr>(&self, key: &str, config_key: &str) -> Result<Option<T>, ConfigError> {
        match self.get(key) {
            Some(raw) => raw.parse::<T>().map(Some).map_err(|_| ConfigError::InvalidValue {
                key: config_key.to_string(),
                value: format!("{key}='{raw}' is not a valid number"),
            }),
            None => Ok(None),
        }
    }
}

/// First layer that carries a value, with its source.
fn first_set<T, const N: usize>(layers: [(Option<T>, ConfigSource); N]) -> Option<(T, ConfigSource)> {
    layers
        .into_iter()
        .find_map(|(value, source)| value.map(|v| (v, source)))
}

fn resolve<T, const N: usize>(
    attribution: &mut HashMap<String, ConfigSource>,
    key: &str,
    layers: [(Option<T>, ConfigSource); N],
    default: impl FnOnce() -> T,
) -> T {
    let (value, source) = first_set(layers).unwrap_or_else(|| (default(), ConfigSource::Default));
    attribution.insert(key.to_string(), source);
    value
}

fn split_keys(raw: &str) -> impl Iterator<Item = String> + '_ {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
}

impl Config {
    /// Discover configuration from the current directory and process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a config file cannot be read or parsed, an
    /// environment value is malformed, or validation fails.
    pub fn discover(cli_args: &CliArgs) -> Result<Self, ConfigError> {
        let start_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::discover_from(&start_dir, cli_args, &EnvVars::from_process())
    }

    /// Discover configuration with an explicit start directory and environment.
    ///
    /// Precedence: CLI > environment > config file > defaults.
    pub fn discover_from(
        start_dir: &Path,
        cli_args: &CliArgs,
        env: &EnvVars,
    ) -> Result<Self, ConfigError> {
        let mut attribution = HashMap::new();

        let file = match Self::locate_config_file(start_dir, cli_args, env) {
            Some(path) => Self::load_config_file(&path)?,
            None => TomlConfig::default(),
        };
        let file_server = file.server.unwrap_or_default();
        let file_provider = file.provider.unwrap_or_default();
        let file_access = file.access.unwrap_or_default();
        let file_logging = file.logging.unwrap_or_default();

        use ConfigSource::{Cli, Config as File, Env};

        // Provider kind comes first: the remaining provider defaults depend on it
        let kind_name = resolve(
            &mut attribution,
            "provider.name",
            [
                (cli_args.provider.clone(), Cli),
                (env.get_owned("LLM_PROVIDER"), Env),
                (file_provider.name, File),
            ],
            || DEFAULT_PROVIDER.as_str().to_string(),
        );
        let kind = ProviderKind::from_str(kind_name.trim()).map_err(|_| {
            ConfigError::InvalidValue {
                key: "provider.name".to_string(),
                value: format!(
                    "unknown provider '{kind_name}' (expected ollama, deepseek, openai or anthropic)"
                ),
            }
        })?;

        let model = resolve(
            &mut attribution,
            "provider.model",
            [
                (cli_args.model.clone(), Cli),
                (env.get_owned("LLM_MODEL"), Env),
                (file_provider.model, File),
            ],
            || kind.default_model().to_string(),
        );

        let env_base_url = env.get_owned("LLM_BASE_URL").or_else(|| {
            (kind == ProviderKind::Ollama)
                .then(|| env.get_owned("OLLAMA_BASE_URL"))
                .flatten()
        });
        let base_url = resolve(
            &mut attribution,
            "provider.base_url",
            [
                (cli_args.base_url.clone(), Cli),
                (env_base_url, Env),
                (file_provider.base_url, File),
            ],
            || kind.default_base_url().to_string(),
        );

        let api_key = first_set([
            (env.get_owned("LLM_API_KEY"), Env),
            (file_provider.api_key, File),
        ])
        .map(|(key, source)| {
            attribution.insert("provider.api_key".to_string(), source);
            key
        });

        let timeout_secs = resolve(
            &mut attribution,
            "provider.timeout_secs",
            [
                (cli_args.timeout_secs, Cli),
                (env.parse("LLM_TIMEOUT_SECONDS", "provider.timeout_secs")?, Env),
                (file_provider.timeout_secs, File),
            ],
            || kind.default_timeout_secs(),
        );

        let max_tokens = resolve(
            &mut attribution,
            "provider.max_tokens",
            [
                (env.parse("LLM_MAX_TOKENS", "provider.max_tokens")?, Env),
                (file_provider.max_tokens, File),
            ],
            || DEFAULT_MAX_TOKENS,
        );
        let quick_max_tokens = resolve(
            &mut attribution,
            "provider.quick_max_tokens",
            [(file_provider.quick_max_tokens, File)],
            || DEFAULT_QUICK_MAX_TOKENS,
        );
        let temperature = resolve(
            &mut attribution,
            "provider.temperature",
            [(file_provider.temperature, File)],
            || DEFAULT_TEMPERATURE,
        );

        let host = resolve(
            &mut attribution,
            "server.host",
            [
                (cli_args.host.clone(), Cli),
                (env.get_owned("PLANCOACH_HOST"), Env),
                (file_server.host, File),
            ],
            || DEFAULT_HOST.to_string(),
        );
        let port = resolve(
            &mut attribution,
            "server.port",
            [
                (cli_args.port, Cli),
                (env.parse("PLANCOACH_PORT", "server.port")?, Env),
                (file_server.port, File),
            ],
            || DEFAULT_PORT,
        );

        let mut env_keys: Vec<String> = env.get("API_KEYS").map(split_keys).into_iter().flatten().collect();
        env_keys.extend(env.get_owned("API_KEY"));
        let api_keys = resolve(
            &mut attribution,
            "access.api_keys",
            [
                ((!env_keys.is_empty()).then_some(env_keys), Env),
                (file_access.api_keys, File),
            ],
            Vec::new,
        );

        let verbose = resolve(
            &mut attribution,
            "logging.verbose",
            [
                (cli_args.verbose.then_some(true), Cli),
                (file_logging.verbose, File),
            ],
            || false,
        );
        let json = resolve(
            &mut attribution,
            "logging.json",
            [
                (cli_args.log_json.then_some(true), Cli),
                (file_logging.json, File),
            ],
            || false,
        );

        let config = Self {
            server: ServerConfig { host, port },
            provider: ProviderConfig {
                kind,
                model,
                base_url: base_url.trim_end_matches('/').to_string(),
                api_key,
                timeout: Duration::from_secs(timeout_secs),
                max_tokens,
                quick_max_tokens,
                temperature,
            },
            access: AccessConfig { api_keys },
            logging: LoggingConfig { verbose, json },
            source_attribution: attribution,
        };

        config.validate()?;

        Ok(config)
    }

    /// Explicit `--config`, then `PLANCOACH_CONFIG`, then `plancoach.toml` in `start_dir`.
    fn locate_config_file(start_dir: &Path, cli_args: &CliArgs, env: &EnvVars) -> Option<PathBuf> {
        if let Some(explicit) = &cli_args.config_path {
            return Some(explicit.clone());
        }
        if let Some(from_env) = env.get("PLANCOACH_CONFIG") {
            return Some(PathBuf::from(from_env));
        }
        let candidate = start_dir.join(CONFIG_FILE_NAME);
        candidate.is_file().then_some(candidate)
    }

    fn load_config_file(path: &Path) -> Result<TomlConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: path.display().to_string(),
                }
            } else {
                ConfigError::InvalidFile(format!("{}: {e}", path.display()))
            }
        })?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::InvalidFile(format!("{}: {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, body: &str) {
        fs::write(dir.path().join(CONFIG_FILE_NAME), body).unwrap();
    }

    fn keyed_env() -> Vec<(&'static str, &'static str)> {
        vec![("LLM_API_KEY", "provider-key"), ("API_KEYS", "client-a")]
    }

    #[test]
    fn test_defaults_without_file_or_env() {
        let dir = TempDir::new().unwrap();
        let env = EnvVars::from_pairs(keyed_env());

        let config = Config::discover_from(dir.path(), &CliArgs::default(), &env).unwrap();

        assert_eq!(config.provider.kind, ProviderKind::DeepSeek);
        assert_eq!(config.provider.model, "deepseek-reasoner");
        assert_eq!(config.provider.base_url, "https://api.deepseek.com/v1");
        assert_eq!(config.provider.timeout, Duration::from_secs(60));
        assert_eq!(config.provider.max_tokens, 2000);
        assert_eq!(config.provider.quick_max_tokens, 500);
        assert_eq!(config.server.port, 8001);
        assert_eq!(
            config.source_attribution.get("provider.model"),
            Some(&ConfigSource::Default)
        );
        assert_eq!(
            config.source_attribution.get("provider.api_key"),
            Some(&ConfigSource::Env)
        );
    }

    #[test]
    fn test_ollama_defaults_follow_kind() {
        let dir = TempDir::new().unwrap();
        let env = EnvVars::from_pairs([
            ("LLM_PROVIDER", "ollama"),
            ("OLLAMA_BASE_URL", "http://gpu-box:11434/v1/"),
        ]);

        let config = Config::discover_from(dir.path(), &CliArgs::default(), &env).unwrap();

        assert_eq!(config.provider.kind, ProviderKind::Ollama);
        assert_eq!(config.provider.model, "llama3.1:8b");
        assert_eq!(config.provider.base_url, "http://gpu-box:11434/v1");
        assert_eq!(config.provider.timeout, Duration::from_secs(120));
        assert!(config.provider.api_key.is_none());
    }

    #[test]
    fn test_precedence_cli_over_env_over_file() {
        let dir = TempDir::new().unwrap();
        write_config(
            &dir,
            r#"
[provider]
name = "openai"
model = "gpt-4"
timeout_secs = 30
max_tokens = 1500

[server]
port = 9000
"#,
        );
        let env = EnvVars::from_pairs([
            ("LLM_MODEL", "gpt-4-turbo"),
            ("LLM_API_KEY", "provider-key"),
            ("PLANCOACH_PORT", "9100"),
        ]);
        let cli = CliArgs {
            timeout_secs: Some(45),
            ..Default::default()
        };

        let config = Config::discover_from(dir.path(), &cli, &env).unwrap();

        assert_eq!(config.provider.kind, ProviderKind::OpenAi);
        assert_eq!(config.provider.model, "gpt-4-turbo");
        assert_eq!(config.provider.timeout, Duration::from_secs(45));
        assert_eq!(config.provider.max_tokens, 1500);
        assert_eq!(config.server.port, 9100);

        let src = &config.source_attribution;
        assert_eq!(src.get("provider.name"), Some(&ConfigSource::Config));
        assert_eq!(src.get("provider.model"), Some(&ConfigSource::Env));
        assert_eq!(src.get("provider.timeout_secs"), Some(&ConfigSource::Cli));
        assert_eq!(src.get("provider.max_tokens"), Some(&ConfigSource::Config));
    }

    #[test]
    fn test_access_keys_from_env_replace_file_keys() {
        let dir = TempDir::new().unwrap();
        write_config(
            &dir,
            r#"
[access]
api_keys = ["file-key"]
"#,
        );
        let env = EnvVars::from_pairs([
            ("LLM_API_KEY", "provider-key"),
            ("API_KEYS", " alpha , beta ,,"),
            ("API_KEY", "gamma"),
        ]);

        let config = Config::discover_from(dir.path(), &CliArgs::default(), &env).unwrap();

        assert_eq!(config.access.api_keys, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_access_keys_from_file() {
        let dir = TempDir::new().unwrap();
        write_config(
            &dir,
            r#"
[access]
api_keys = ["file-key"]
"#,
        );
        let env = EnvVars::from_pairs([("LLM_API_KEY", "provider-key")]);

        let config = Config::discover_from(dir.path(), &CliArgs::default(), &env).unwrap();

        assert_eq!(config.access.api_keys, vec!["file-key"]);
        assert_eq!(
            config.source_attribution.get("access.api_keys"),
            Some(&ConfigSource::Config)
        );
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let dir = TempDir::new().unwrap();
        let env = EnvVars::from_pairs([("LLM_PROVIDER", "gemini")]);

        match Config::discover_from(dir.path(), &CliArgs::default(), &env) {
            Err(ConfigError::InvalidValue { key, value }) => {
                assert_eq!(key, "provider.name");
                assert!(value.contains("gemini"), "got: {value}");
            }
            other => panic!("Expected InvalidValue for provider.name, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_env_number_is_rejected() {
        let dir = TempDir::new().unwrap();
        let env = EnvVars::from_pairs([("LLM_TIMEOUT_SECONDS", "soon")]);

        match Config::discover_from(dir.path(), &CliArgs::default(), &env) {
            Err(ConfigError::InvalidValue { key, .. }) => {
                assert_eq!(key, "provider.timeout_secs");
            }
            other => panic!("Expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn test_explicit_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let cli = CliArgs {
            config_path: Some(dir.path().join("absent.toml")),
            ..Default::default()
        };

        match Config::discover_from(dir.path(), &cli, &EnvVars::default()) {
            Err(ConfigError::NotFound { path }) => assert!(path.ends_with("absent.toml")),
            other => panic!("Expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_toml_key_is_invalid_file() {
        let dir = TempDir::new().unwrap();
        write_config(
            &dir,
            r#"
[provider]
nmae = "openai"
"#,
        );

        match Config::discover_from(dir.path(), &CliArgs::default(), &EnvVars::default()) {
            Err(ConfigError::InvalidFile(msg)) => assert!(msg.contains("nmae"), "got: {msg}"),
            other => panic!("Expected InvalidFile, got {other:?}"),
        }
    }

    #[test]
    #[serial_test::serial]
    fn test_from_process_reads_environment() {
        // SAFETY: serialized with other environment-mutating tests
        unsafe { std::env::set_var("PLANCOACH_DISCOVERY_PROBE", "probe-value") };
        let env = EnvVars::from_process();
        unsafe { std::env::remove_var("PLANCOACH_DISCOVERY_PROBE") };

        assert_eq!(env.get("PLANCOACH_DISCOVERY_PROBE"), Some("probe-value"));
    }

    #[test]
    fn test_blank_env_values_are_unset() {
        let env = EnvVars::from_pairs([("LLM_MODEL", "   ")]);
        assert_eq!(env.get("LLM_MODEL"), None);
    }
}
