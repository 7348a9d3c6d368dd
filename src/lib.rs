//! plancoach - LLM advisory service for failed shift-planning runs
//!
//! Given diagnostics from an optimization run that came back INFEASIBLE,
//! plancoach renders a deterministic prompt, calls one configured LLM
//! provider, and normalizes the reply into a ranked list of constraint
//! relaxations.
//!
//! # Quick Start (CLI)
//!
//! ```bash
//! export LLM_PROVIDER=deepseek LLM_API_KEY=... API_KEYS=client-a
//! plancoach serve --port 8001
//! ```
//!
//! # Quick Start (Library)
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use plancoach::{CallLimits, Config, Orchestrator};
//!
//! # async fn demo(report: plancoach::DiagnosticReport) -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::builder()
//!     .provider(plancoach::ProviderKind::Ollama)
//!     .build()?;
//! let provider = plancoach_llm::from_config(&config.provider)?;
//! let orchestrator = Orchestrator::new(provider, CallLimits::from(&config.provider));
//!
//! let advisory = orchestrator.analyze_planning(&report).await?;
//! for step in &advisory.relaxation_suggestions {
//!     println!("{}. {} ({})", step.priority, step.constraint_to_relax, step.risk_level);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Crates
//!
//! | Crate | Role |
//! |-------|------|
//! | `plancoach-llm` | provider clients |
//! | `plancoach-prompt-template` | prompt rendering |
//! | `plancoach-extraction` | tolerant reply decoding |
//! | `plancoach-gate` | inbound API-key check |
//! | `plancoach-orchestrator` | one request end to end |
//! | `plancoach-config` | layered configuration |

pub mod cli;
pub mod server;

pub use plancoach_config::{CliArgs, Config, ConfigBuilder, ProviderKind};
pub use plancoach_gate::{AccessGate, AuthDecision};
pub use plancoach_orchestrator::{CallLimits, Orchestrator, OrchestratorError};
pub use plancoach_utils::error::{ConfigError, ParseError, PlanCoachError, ProviderError};
pub use plancoach_utils::exit_codes::ExitCode;
pub use plancoach_utils::types::{
    AdvisoryResult, DiagnosticReport, QuickAdvice, QuickAdviceRequest, RelaxationSuggestion,
    RiskLevel,
};
