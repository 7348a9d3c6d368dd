use std::path::PathBuf;

/// Configuration overrides supplied on the command line.
///
/// The provider API key has no flag. It is read from the environment or
/// the config file.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config_path: Option<PathBuf>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub verbose: bool,
    pub log_json: bool,
}
