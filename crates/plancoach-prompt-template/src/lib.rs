//! Prompt rendering for plancoach
//!
//! Both prompts are pure functions of their input: no timestamps, no
//! randomness, no map iteration. Identical input always yields
//! byte-identical text.

mod full_analysis;

pub use full_analysis::build_full_analysis_prompt;

/// The two request paths. They never mix within one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// Structured analysis with a JSON response contract.
    FullAnalysis,
    /// Short free-text guidance, no exemplar.
    QuickAdvice,
}

impl PromptKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FullAnalysis => "full-analysis",
            Self::QuickAdvice => "quick-advice",
        }
    }
}

impl std::fmt::Display for PromptKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numbered list, or `None` when empty.
pub(crate) fn numbered_list(items: &[String]) -> String {
    if items.is_empty() {
        return "None".to_string();
    }
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {item}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prompt for the quick-advice path.
#[must_use]
pub fn build_quick_advice_prompt(failure_message: &str, strategies_attempted: &[String]) -> String {
    format!(
        "You are an expert in constraint programming and shift scheduling optimization.\n\
         \n\
         An optimization run failed with this message:\n\
         \"{failure_message}\"\n\
         \n\
         Strategies already attempted:\n\
         {strategies}\n\
         \n\
         Provide 2-3 quick suggestions for what to try next. Be specific and actionable. \
         Answer in plain text, not JSON.\n",
        strategies = numbered_list(strategies_attempted),
    )
}
