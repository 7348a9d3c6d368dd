//! Configuration management for plancoach
//!
//! Precedence: CLI > environment > config file > defaults. The resolved
//! [`Config`] is immutable and shared read-only by every request.

mod config;

pub use config::*;
