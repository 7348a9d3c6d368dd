//! CLI argument definitions (clap)

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use plancoach_config::CliArgs;

/// plancoach - LLM advisory service for failed shift-planning runs
#[derive(Debug, Parser)]
#[command(name = "plancoach")]
#[command(about = "LLM advisory service for failed shift-planning optimization runs")]
#[command(long_about = r#"
plancoach receives diagnostics from a failed constraint-optimization run,
asks a configured LLM provider why the problem is infeasible, and returns a
structured ladder of constraint relaxations to try next.

EXAMPLES:
  # Serve the HTTP API with keys from the environment
  API_KEYS=client-a,client-b LLM_API_KEY=... plancoach serve --port 8001

  # Use a local Ollama model
  plancoach --provider ollama --model qwen2.5:14b serve

  # Validate configuration and provider setup
  plancoach check

  # Show effective configuration and where each value came from
  plancoach config --json

CONFIGURATION:
  Precedence: CLI flags > environment > config file > defaults
  Config file: --config, else PLANCOACH_CONFIG, else ./plancoach.toml
  A .env file in the working directory is loaded first
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// LLM provider: ollama, deepseek, openai, anthropic
    #[arg(long, global = true)]
    pub provider: Option<String>,

    /// Model name for the provider
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Provider base URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Provider call timeout in seconds (1-600)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Serve the HTTP API
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Bind port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Validate configuration and construct the provider client
    Check,

    /// Print the effective configuration with value sources
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the supported provider catalog as JSON
    Providers,
}

impl Cli {
    /// Overrides handed to configuration discovery.
    #[must_use]
    pub fn to_cli_args(&self) -> CliArgs {
        let (host, port) = match &self.command {
            Commands::Serve { host, port } => (host.clone(), *port),
            _ => (None, None),
        };
        CliArgs {
            config_path: self.config.clone(),
            provider: self.provider.clone(),
            model: self.model.clone(),
            base_url: self.base_url.clone(),
            timeout_secs: self.timeout,
            host,
            port,
            verbose: self.verbose,
            log_json: self.log_json,
        }
    }
}
