//! Request orchestration for plancoach
//!
//! One request is one pass through prompt rendering, a single provider
//! call, and reply parsing. There is no retry and no provider fallback:
//! provider selection is fixed at startup.
//!
//! # Architecture
//!
//! - **Orchestrator**: holds the shared provider client and call limits
//! - **RequestPhase**: per-request state machine, logged at each step
//! - **OrchestratorError**: provider failure or unusable reply, kept apart
//!   so the HTTP layer can map them to distinct statuses

mod phase;

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use plancoach_config::ProviderConfig;
use plancoach_extraction::{parse_full_analysis, parse_quick_advice};
use plancoach_llm::{ProviderClient, ProviderKind, RawCompletion};
use plancoach_prompt_template::{PromptKind, build_full_analysis_prompt, build_quick_advice_prompt};
use plancoach_utils::error::{ParseError, PlanCoachError, ProviderError};
use plancoach_utils::types::{AdvisoryResult, DiagnosticReport, QuickAdvice, QuickAdviceRequest};
use thiserror::Error;
use tracing::{debug, info, warn};

pub use phase::RequestPhase;
use phase::RequestTrace;

/// Failure of a single advisory request.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The reply arrived but could not be used. Carries the raw text.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl From<OrchestratorError> for PlanCoachError {
    fn from(err: OrchestratorError) -> Self {
        match err {
            OrchestratorError::Provider(e) => Self::Provider(e),
            OrchestratorError::Parse(e) => Self::Parse(e),
        }
    }
}

/// Call limits applied by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallLimits {
    /// Upper bound on one provider call, enforced here regardless of the backend.
    pub timeout: Duration,
    pub max_tokens: u32,
    pub quick_max_tokens: u32,
}

impl From<&ProviderConfig> for CallLimits {
    fn from(config: &ProviderConfig) -> Self {
        Self {
            timeout: config.timeout,
            max_tokens: config.max_tokens,
            quick_max_tokens: config.quick_max_tokens,
        }
    }
}

/// Composes prompt building, the provider call and reply parsing.
///
/// Immutable after construction; share it behind an `Arc`.
pub struct Orchestrator {
    provider: Arc<dyn ProviderClient>,
    limits: CallLimits,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("provider", &self.provider.kind())
            .field("model", &self.provider.model())
            .field("limits", &self.limits)
            .finish()
    }
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn ProviderClient>, limits: CallLimits) -> Self {
        Self { provider, limits }
    }

    #[must_use]
    pub fn provider_kind(&self) -> ProviderKind {
        self.provider.kind()
    }

    #[must_use]
    pub fn model(&self) -> &str {
        self.provider.model()
    }

    #[must_use]
    pub fn limits(&self) -> CallLimits {
        self.limits
    }

    /// Full structured analysis of a failed run.
    ///
    /// # Errors
    ///
    /// `OrchestratorError::Provider` when the backend fails or exceeds the
    /// configured timeout, `OrchestratorError::Parse` when the reply holds
    /// no usable advisory.
    pub async fn analyze_planning(
        &self,
        report: &DiagnosticReport,
    ) -> Result<AdvisoryResult, OrchestratorError> {
        let mut trace = RequestTrace::start(PromptKind::FullAnalysis.as_str());

        let prompt = build_full_analysis_prompt(report);
        trace.advance(RequestPhase::PromptBuilt);
        debug!(
            planning_id = report.planning_id,
            critical_days = report.critical_day_count(),
            prompt_chars = prompt.len(),
            "full-analysis prompt built"
        );

        let completion = self
            .call(&mut trace, &prompt, self.limits.max_tokens)
            .await?;

        match parse_full_analysis(&completion) {
            Ok(parsed) => {
                trace.advance(RequestPhase::Parsed);
                if parsed.is_degraded() {
                    info!(
                        planning_id = report.planning_id,
                        diagnostics = parsed.diagnostics.len(),
                        "advisory returned with coercions"
                    );
                }
                Ok(parsed.into_result(report.planning_id, Utc::now()))
            }
            Err(err) => {
                trace.advance(RequestPhase::Failed);
                warn!(
                    planning_id = report.planning_id,
                    kind = %err.kind,
                    reply_chars = err.raw_text.len(),
                    "reply could not be interpreted"
                );
                Err(err.into())
            }
        }
    }

    /// Short free-text advice.
    ///
    /// # Errors
    ///
    /// As [`Orchestrator::analyze_planning`]; the parse failure here is an
    /// empty reply.
    pub async fn quick_advice(
        &self,
        request: &QuickAdviceRequest,
    ) -> Result<QuickAdvice, OrchestratorError> {
        let mut trace = RequestTrace::start(PromptKind::QuickAdvice.as_str());

        let prompt =
            build_quick_advice_prompt(&request.failure_message, &request.strategies_attempted);
        trace.advance(RequestPhase::PromptBuilt);

        let completion = self
            .call(&mut trace, &prompt, self.limits.quick_max_tokens)
            .await?;

        match parse_quick_advice(&completion) {
            Ok(advice) => {
                trace.advance(RequestPhase::Parsed);
                Ok(QuickAdvice {
                    advice,
                    timestamp: Utc::now(),
                })
            }
            Err(err) => {
                trace.advance(RequestPhase::Failed);
                warn!(kind = %err.kind, "quick advice reply was empty");
                Err(err.into())
            }
        }
    }

    /// One bounded provider call. Dropping the returned future cancels it.
    async fn call(
        &self,
        trace: &mut RequestTrace,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<RawCompletion, ProviderError> {
        trace.advance(RequestPhase::AwaitingProvider);
        let started = Instant::now();
        debug!(
            provider = %self.provider.kind(),
            model = %self.provider.model(),
            max_tokens,
            timeout_secs = self.limits.timeout.as_secs(),
            "calling provider"
        );

        let outcome = tokio::time::timeout(
            self.limits.timeout,
            self.provider.generate(prompt, max_tokens),
        )
        .await
        .unwrap_or_else(|_| {
            Err(ProviderError::Timeout {
                provider: self.provider.kind().to_string(),
                duration: self.limits.timeout,
            })
        });

        match outcome {
            Ok(completion) => {
                let usage = completion.usage.unwrap_or_default();
                debug!(
                    provider = %completion.provider,
                    model = %completion.model,
                    input_tokens = usage.input_tokens,
                    output_tokens = usage.output_tokens,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "provider replied"
                );
                Ok(completion)
            }
            Err(err) => {
                trace.advance(RequestPhase::Failed);
                warn!(
                    provider = %self.provider.kind(),
                    error_kind = ?err.kind(),
                    upstream_status = err.upstream_status(),
                    duration_ms = started.elapsed().as_millis() as u64,
                    "provider call failed"
                );
                Err(err)
            }
        }
    }
}
