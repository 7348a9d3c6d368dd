//! Per-request state machine.

use std::fmt;

use tracing::{debug, warn};

/// `Idle → PromptBuilt → AwaitingProvider → {Parsed | Failed}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPhase {
    Idle,
    PromptBuilt,
    AwaitingProvider,
    Parsed,
    Failed,
}

impl RequestPhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::PromptBuilt => "prompt_built",
            Self::AwaitingProvider => "awaiting_provider",
            Self::Parsed => "parsed",
            Self::Failed => "failed",
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Parsed | Self::Failed)
    }

    /// Whether `next` is a legal successor.
    #[must_use]
    pub const fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::PromptBuilt)
                | (Self::PromptBuilt, Self::AwaitingProvider)
                | (Self::AwaitingProvider, Self::Parsed | Self::Failed)
        )
    }
}

impl fmt::Display for RequestPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks and logs one request's progress.
#[derive(Debug)]
pub(crate) struct RequestTrace {
    path: &'static str,
    phase: RequestPhase,
}

impl RequestTrace {
    pub(crate) fn start(path: &'static str) -> Self {
        Self {
            path,
            phase: RequestPhase::Idle,
        }
    }

    pub(crate) fn phase(&self) -> RequestPhase {
        self.phase
    }

    pub(crate) fn advance(&mut self, next: RequestPhase) {
        if !self.phase.can_advance_to(next) {
            warn!(path = self.path, from = %self.phase, to = %next, "unexpected request phase transition");
        }
        debug!(path = self.path, from = %self.phase, to = %next, "request phase");
        self.phase = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_transitions() {
        use RequestPhase::*;
        assert!(Idle.can_advance_to(PromptBuilt));
        assert!(PromptBuilt.can_advance_to(AwaitingProvider));
        assert!(AwaitingProvider.can_advance_to(Parsed));
        assert!(AwaitingProvider.can_advance_to(Failed));

        assert!(!Idle.can_advance_to(AwaitingProvider));
        assert!(!Parsed.can_advance_to(Failed));
        assert!(!Failed.can_advance_to(Idle));
    }

    #[test]
    fn test_terminal_phases() {
        assert!(RequestPhase::Parsed.is_terminal());
        assert!(RequestPhase::Failed.is_terminal());
        assert!(!RequestPhase::AwaitingProvider.is_terminal());
    }

    #[test]
    fn test_trace_follows_advances() {
        let mut trace = RequestTrace::start("quick-advice");
        trace.advance(RequestPhase::PromptBuilt);
        trace.advance(RequestPhase::AwaitingProvider);
        trace.advance(RequestPhase::Failed);
        assert_eq!(trace.phase(), RequestPhase::Failed);
    }
}
