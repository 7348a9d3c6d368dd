//! Reply interpretation for plancoach
//!
//! Turns raw backend text into an advisory. Decoding is tolerant: the JSON
//! object may sit inside a fenced block or surrounding prose, may use
//! camelCase keys, and may carry trailing commas. Every coercion applied is
//! recorded as a [`ParseDiagnostic`] so callers can tell a clean reply from
//! a repaired one. Only replies with no usable structure at all fail.

mod coerce;
mod locate;
mod quick;

use chrono::{DateTime, Utc};
use plancoach_llm::RawCompletion;
use plancoach_utils::error::ParseError;
use plancoach_utils::types::{AdvisoryResult, ParseDiagnostic, RelaxationSuggestion};
use serde_json::Value;
use tracing::debug;

/// A decoded full-analysis reply, before it is stamped with request identity.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedAdvisory {
    pub root_cause_summary: String,
    pub critical_issues: Vec<String>,
    /// Ascending priority.
    pub relaxation_suggestions: Vec<RelaxationSuggestion>,
    pub long_term_recommendations: Vec<String>,
    pub reasoning_trace: Option<String>,
    pub diagnostics: Vec<ParseDiagnostic>,
}

impl ParsedAdvisory {
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    #[must_use]
    pub fn into_result(self, planning_id: i64, analysis_timestamp: DateTime<Utc>) -> AdvisoryResult {
        let degraded = self.is_degraded();
        AdvisoryResult {
            analysis_timestamp,
            planning_id,
            root_cause_summary: self.root_cause_summary,
            critical_issues: self.critical_issues,
            relaxation_suggestions: self.relaxation_suggestions,
            long_term_recommendations: self.long_term_recommendations,
            reasoning_trace: self.reasoning_trace,
            parse_diagnostics: self.diagnostics,
            degraded,
        }
    }
}

/// Interpret a full-analysis reply.
///
/// A separately delivered reasoning channel wins over any
/// `reasoning_trace` field inside the JSON.
///
/// # Errors
///
/// Returns [`ParseError`] of kind `EmptyOrUnstructured` when the reply is
/// empty, holds no decodable JSON object, or holds an object with neither a
/// root cause nor a `relaxation_suggestions` key.
pub fn parse_full_analysis(completion: &RawCompletion) -> Result<ParsedAdvisory, ParseError> {
    let raw = completion.text.as_str();
    if raw.trim().is_empty() {
        return Err(ParseError::unstructured("model returned an empty reply", raw));
    }

    let located = locate::locate_object(raw)
        .ok_or_else(|| ParseError::unstructured("no JSON object found in reply", raw))?;
    let object = located.object;

    let mut diagnostics = Vec::new();
    if located.repaired {
        diagnostics.push(ParseDiagnostic::JsonRepaired);
    }

    let root_cause_summary =
        coerce::text_field(&object, "root_cause_summary", "root_cause_summary", &mut diagnostics);
    let suggestions_value = coerce::field(&object, "relaxation_suggestions");

    if root_cause_summary.is_empty() && suggestions_value.is_none() {
        return Err(ParseError::unstructured(
            "reply has neither a root cause summary nor relaxation suggestions",
            raw,
        ));
    }

    let critical_issues = coerce::string_list(&object, "critical_issues", &mut diagnostics);
    let raw_suggestions = coerce::suggestions(suggestions_value, &mut diagnostics);
    let relaxation_suggestions = coerce::normalize_priorities(raw_suggestions, &mut diagnostics);
    let long_term_recommendations =
        coerce::string_list(&object, "long_term_recommendations", &mut diagnostics);

    let reasoning_trace = completion
        .reasoning
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .or_else(|| match coerce::field(&object, "reasoning_trace") {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        });

    if !diagnostics.is_empty() {
        debug!(
            provider = %completion.provider,
            count = diagnostics.len(),
            "reply decoded with coercions"
        );
    }

    Ok(ParsedAdvisory {
        root_cause_summary,
        critical_issues,
        relaxation_suggestions,
        long_term_recommendations,
        reasoning_trace,
        diagnostics,
    })
}

/// Interpret a quick-advice reply as plain text.
///
/// # Errors
///
/// Returns [`ParseError`] of kind `EmptyReply` when nothing is left after
/// whitespace normalization.
pub fn parse_quick_advice(completion: &RawCompletion) -> Result<String, ParseError> {
    quick::normalize_text(&completion.text)
}
