//! Configuration management for plancoach
//!
//! Supports TOML configuration files with `[server]`, `[provider]`,
//! `[access]` and `[logging]` sections, overlaid by environment variables
//! and CLI flags.

mod builder;
mod cli_args;
mod discovery;
mod model;
mod sources;
mod validation;

pub use builder::ConfigBuilder;
pub use cli_args::CliArgs;
pub use discovery::{CONFIG_FILE_NAME, EnvVars};
pub use model::*;
pub use plancoach_utils::error::ConfigError;
pub use plancoach_utils::types::{ConfigSource, ProviderKind};
