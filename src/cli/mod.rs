//! Command-line interface for plancoach
//!
//! - `args`: clap definitions
//! - `run`: entry point and dispatch
//! - `commands`: command implementations

pub mod args;
mod commands;
mod run;

pub use args::{Cli, Commands};
pub use commands::build_state;
pub use run::run;
