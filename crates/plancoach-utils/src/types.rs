//! Wire and domain types shared across plancoach crates.
//!
//! Every type here serializes with `camelCase` field names. Input types also
//! accept the `snake_case` spelling emitted by the upstream optimizer, so a
//! report can be forwarded from the solver without reshaping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Facts about a failed optimization run, as produced by the solver.
///
/// Immutable once received; the orchestrator only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticReport {
    #[serde(alias = "planning_id")]
    pub planning_id: i64,
    pub month: u32,
    pub year: i32,
    #[serde(alias = "failure_message")]
    pub failure_message: String,
    #[serde(default, alias = "time_limit_seconds")]
    pub time_limit_seconds: u64,
    /// Strategies the solver already tried, in the order it tried them.
    #[serde(default, alias = "strategies_attempted")]
    pub strategies_attempted: Vec<String>,
    #[serde(default)]
    pub employees: Vec<EmployeeSummary>,
    /// One entry per calendar day of the planning month.
    #[serde(default, alias = "daily_diagnostics")]
    pub daily_diagnostics: Vec<DayDiagnostic>,
    #[serde(default, alias = "min_daily_coverage")]
    pub min_daily_coverage: u32,
    #[serde(
        default,
        alias = "max_daily_coverage",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_daily_coverage: Option<u32>,
    #[serde(
        default,
        alias = "constraint_violations",
        skip_serializing_if = "Option::is_none"
    )]
    pub constraint_violations: Option<Vec<ConstraintViolation>>,
    #[serde(default, alias = "manual_shift_count")]
    pub manual_shift_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl DiagnosticReport {
    #[must_use]
    pub fn total_employees(&self) -> usize {
        self.employees.len()
    }

    #[must_use]
    pub fn intern_count(&self) -> usize {
        self.employees.iter().filter(|e| e.is_intern).count()
    }

    /// Number of days whose capacity gap is non-zero.
    #[must_use]
    pub fn critical_day_count(&self) -> usize {
        self.daily_diagnostics
            .iter()
            .filter(|d| d.gap() > 0)
            .count()
    }

    #[must_use]
    pub fn weekend_day_count(&self) -> usize {
        self.daily_diagnostics
            .iter()
            .filter(|d| d.is_weekend)
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeSummary {
    pub id: i64,
    pub abbreviation: String,
    #[serde(default, alias = "contract_hours_per_week")]
    pub contract_hours_per_week: f64,
    #[serde(default, alias = "contract_hours_per_day")]
    pub contract_hours_per_day: f64,
    #[serde(default, alias = "is_intern")]
    pub is_intern: bool,
    /// Weekday indices (0 = Monday) an intern spends at school.
    #[serde(default, alias = "school_days", skip_serializing_if = "Option::is_none")]
    pub school_days: Option<Vec<u32>>,
}

/// Staffing facts for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayDiagnostic {
    pub day: u32,
    #[serde(default)]
    pub weekday: String,
    #[serde(default, alias = "required_coverage")]
    pub required_coverage: u32,
    #[serde(default, alias = "available_employees")]
    pub available_employees: u32,
    /// Interns unavailable because of school.
    #[serde(default, alias = "intern_school_count")]
    pub intern_school_count: u32,
    #[serde(default, alias = "holiday_requests")]
    pub holiday_requests: u32,
    #[serde(default, alias = "effective_capacity")]
    pub effective_capacity: u32,
    #[serde(default, alias = "capacity_gap", skip_serializing_if = "Option::is_none")]
    pub capacity_gap: Option<u32>,
    #[serde(default, alias = "is_weekend")]
    pub is_weekend: bool,
    #[serde(default, alias = "is_holiday")]
    pub is_holiday: bool,
}

impl DayDiagnostic {
    /// Shortfall between required coverage and effective capacity.
    ///
    /// Uses the reported gap when present, else `max(0, required - effective)`.
    #[must_use]
    pub fn gap(&self) -> u32 {
        self.capacity_gap.unwrap_or_else(|| {
            self.required_coverage
                .saturating_sub(self.effective_capacity)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintViolation {
    #[serde(alias = "constraint_type")]
    pub constraint_type: String,
    pub severity: String,
    pub description: String,
    #[serde(
        default,
        alias = "affected_employees",
        skip_serializing_if = "Option::is_none"
    )]
    pub affected_employees: Option<Vec<i64>>,
    #[serde(default, alias = "affected_days", skip_serializing_if = "Option::is_none")]
    pub affected_days: Option<Vec<u32>>,
}

/// Risk of applying a relaxation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl RiskLevel {
    /// Case-insensitive match on `low`, `medium` or `high`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One proposed loosening of a constraint. Priority 1 is the highest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelaxationSuggestion {
    pub priority: u32,
    pub constraint_to_relax: String,
    pub relaxation_strategy: String,
    pub description: String,
    pub expected_impact: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implementation_code: Option<String>,
    pub risk_level: RiskLevel,
}

/// A non-fatal coercion applied while normalizing a backend reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ParseDiagnostic {
    /// Trailing commas were removed before the payload decoded.
    JsonRepaired,
    /// An optional top-level or suggestion field was absent.
    MissingField { field: String },
    /// A scalar appeared where a list was expected.
    ScalarCoercedToList { field: String },
    /// A suggestion entry was not an object and was discarded.
    SuggestionDropped { index: usize, reason: String },
    /// A suggestion had no usable priority and was placed last.
    PriorityAssigned { index: usize },
    /// Priorities were not strictly increasing; `original` lists them in reply order.
    PrioritiesRenumbered { original: Vec<u32> },
    /// An unknown risk level was replaced with `medium`.
    RiskLevelCoerced { index: usize, original: String },
}

impl fmt::Display for ParseDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::JsonRepaired => write!(f, "trailing commas removed before decoding"),
            Self::MissingField { field } => write!(f, "missing field '{field}'"),
            Self::ScalarCoercedToList { field } => {
                write!(f, "field '{field}' was a scalar, wrapped in a list")
            }
            Self::SuggestionDropped { index, reason } => {
                write!(f, "suggestion #{index} dropped: {reason}")
            }
            Self::PriorityAssigned { index } => {
                write!(f, "suggestion #{index} had no priority")
            }
            Self::PrioritiesRenumbered { original } => {
                write!(f, "priorities {original:?} renumbered")
            }
            Self::RiskLevelCoerced { index, original } => {
                write!(f, "suggestion #{index} risk level '{original}' coerced to medium")
            }
        }
    }
}

/// Structured advisory returned for a full analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisoryResult {
    pub analysis_timestamp: DateTime<Utc>,
    pub planning_id: i64,
    pub root_cause_summary: String,
    pub critical_issues: Vec<String>,
    /// Ordered by ascending priority.
    pub relaxation_suggestions: Vec<RelaxationSuggestion>,
    pub long_term_recommendations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_trace: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parse_diagnostics: Vec<ParseDiagnostic>,
    /// True when any parse diagnostic was recorded.
    #[serde(default)]
    pub degraded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickAdviceRequest {
    #[serde(alias = "failure_message")]
    pub failure_message: String,
    #[serde(default, alias = "strategies_attempted")]
    pub strategies_attempted: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickAdvice {
    pub advice: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub llm_configured: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfo {
    pub service: String,
    pub status: String,
    pub version: String,
    pub llm_provider: String,
    pub llm_model: String,
}

/// Where a backend runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderLocation {
    Local,
    Remote,
}

/// Supported text-generation backends, in catalog order.
///
/// Parsing is case-insensitive: `"DeepSeek"` and `"deepseek"` are the same kind.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ProviderKind {
    Ollama,
    DeepSeek,
    OpenAi,
    Anthropic,
}

impl ProviderKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Remote providers authenticate every call.
    #[must_use]
    pub const fn requires_credential(self) -> bool {
        !matches!(self, Self::Ollama)
    }

    #[must_use]
    pub const fn location(self) -> ProviderLocation {
        match self {
            Self::Ollama => ProviderLocation::Local,
            _ => ProviderLocation::Remote,
        }
    }

    #[must_use]
    pub const fn default_base_url(self) -> &'static str {
        match self {
            Self::Ollama => "http://localhost:11434/v1",
            Self::DeepSeek => "https://api.deepseek.com/v1",
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Anthropic => "https://api.anthropic.com/v1",
        }
    }

    #[must_use]
    pub const fn default_model(self) -> &'static str {
        match self {
            Self::Ollama => "llama3.1:8b",
            Self::DeepSeek => "deepseek-reasoner",
            Self::OpenAi => "gpt-4-turbo",
            Self::Anthropic => "claude-3-opus-20240229",
        }
    }

    /// Local models on consumer hardware get twice the remote budget.
    #[must_use]
    pub const fn default_timeout_secs(self) -> u64 {
        match self {
            Self::Ollama => 120,
            _ => 60,
        }
    }
}

/// Catalog entry for `/supported-providers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInfo {
    pub name: String,
    pub models: Vec<String>,
    pub recommended: bool,
    #[serde(rename = "type")]
    pub location: ProviderLocation,
    pub cost_hint: String,
    pub description: String,
}

/// Source of a configuration value.
///
/// Precedence, highest first: CLI, environment, config file, programmatic,
/// built-in default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Cli,
    Env,
    Config,
    Programmatic,
    Default,
}

impl ConfigSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cli => "cli",
            Self::Env => "env",
            Self::Config => "config",
            Self::Programmatic => "programmatic",
            Self::Default => "default",
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_report_accepts_snake_case_from_optimizer() {
        let report: DiagnosticReport = serde_json::from_value(json!({
            "planning_id": 7,
            "month": 3,
            "year": 2025,
            "failure_message": "INFEASIBLE",
            "time_limit_seconds": 120,
            "strategies_attempted": ["relax_weekends"],
            "employees": [{"id": 1, "abbreviation": "AB", "contract_hours_per_week": 40.0,
                           "contract_hours_per_day": 8.0, "is_intern": true}],
            "daily_diagnostics": [{"day": 1, "weekday": "Sat", "required_coverage": 3,
                                   "effective_capacity": 1, "is_weekend": true}],
            "min_daily_coverage": 2,
            "manual_shift_count": 4
        }))
        .expect("snake_case report should decode");

        assert_eq!(report.planning_id, 7);
        assert_eq!(report.intern_count(), 1);
        assert_eq!(report.manual_shift_count, 4);
        assert_eq!(report.daily_diagnostics[0].gap(), 2);
        assert_eq!(report.weekend_day_count(), 1);
    }

    #[test]
    fn test_day_gap_prefers_reported_value() {
        let day = DayDiagnostic {
            day: 4,
            weekday: "Thu".to_string(),
            required_coverage: 5,
            available_employees: 6,
            intern_school_count: 0,
            holiday_requests: 0,
            effective_capacity: 4,
            capacity_gap: Some(3),
            is_weekend: false,
            is_holiday: false,
        };
        assert_eq!(day.gap(), 3);

        let computed = DayDiagnostic {
            capacity_gap: None,
            ..day.clone()
        };
        assert_eq!(computed.gap(), 1);

        let surplus = DayDiagnostic {
            capacity_gap: None,
            effective_capacity: 9,
            ..day
        };
        assert_eq!(surplus.gap(), 0);
    }

    #[test]
    fn test_risk_level_parse_is_lenient_on_case() {
        assert_eq!(RiskLevel::parse(" HIGH "), Some(RiskLevel::High));
        assert_eq!(RiskLevel::parse("Low"), Some(RiskLevel::Low));
        assert_eq!(RiskLevel::parse("severe"), None);
        assert_eq!(RiskLevel::default(), RiskLevel::Medium);
    }

    #[test]
    fn test_advisory_result_serializes_camel_case() {
        let result = AdvisoryResult {
            analysis_timestamp: Utc::now(),
            planning_id: 42,
            root_cause_summary: "Weekend shortage".to_string(),
            critical_issues: vec![],
            relaxation_suggestions: vec![RelaxationSuggestion {
                priority: 1,
                constraint_to_relax: "weekend_coverage".to_string(),
                relaxation_strategy: "reduce".to_string(),
                description: String::new(),
                expected_impact: String::new(),
                implementation_code: None,
                risk_level: RiskLevel::Low,
            }],
            long_term_recommendations: vec![],
            reasoning_trace: None,
            parse_diagnostics: vec![],
            degraded: false,
        };

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["planningId"], 42);
        assert_eq!(value["relaxationSuggestions"][0]["riskLevel"], "low");
        assert!(value.get("parseDiagnostics").is_none());
        assert!(value.get("reasoningTrace").is_none());
    }

    #[test]
    fn test_parse_diagnostic_is_tagged() {
        let value = serde_json::to_value(ParseDiagnostic::RiskLevelCoerced {
            index: 2,
            original: "extreme".to_string(),
        })
        .unwrap();
        assert_eq!(value["kind"], "riskLevelCoerced");
        assert_eq!(value["original"], "extreme");
    }

    #[test]
    fn test_provider_kind_parses_case_insensitively() {
        use std::str::FromStr;

        assert_eq!(ProviderKind::from_str("DeepSeek").unwrap(), ProviderKind::DeepSeek);
        assert_eq!(ProviderKind::from_str("openai").unwrap(), ProviderKind::OpenAi);
        assert!(ProviderKind::from_str("gemini").is_err());
        assert_eq!(ProviderKind::OpenAi.to_string(), "openai");
        assert_eq!(ProviderKind::Ollama.as_str(), "ollama");
    }

    #[test]
    fn test_only_ollama_runs_without_credential() {
        use strum::IntoEnumIterator;

        let keyless: Vec<_> = ProviderKind::iter()
            .filter(|k| !k.requires_credential())
            .collect();
        assert_eq!(keyless, vec![ProviderKind::Ollama]);
        assert_eq!(ProviderKind::Ollama.location(), ProviderLocation::Local);
        assert_eq!(ProviderKind::Ollama.default_timeout_secs(), 120);
        assert_eq!(ProviderKind::Anthropic.default_timeout_secs(), 60);
    }

    mod properties {
        use super::super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_computed_gap_never_underflows(required in 0u32..50, effective in 0u32..50) {
                let day = DayDiagnostic {
                    day: 1,
                    weekday: "Mon".to_string(),
                    required_coverage: required,
                    available_employees: effective,
                    intern_school_count: 0,
                    holiday_requests: 0,
                    effective_capacity: effective,
                    capacity_gap: None,
                    is_weekend: false,
                    is_holiday: false,
                };
                prop_assert_eq!(day.gap(), required.saturating_sub(effective));
                prop_assert_eq!(day.gap() > 0, required > effective);
            }
        }
    }

    #[test]
    fn test_provider_info_uses_type_key() {
        let info = ProviderInfo {
            name: "ollama".to_string(),
            models: vec!["llama3.1:8b".to_string()],
            recommended: true,
            location: ProviderLocation::Local,
            cost_hint: "$0".to_string(),
            description: "Local".to_string(),
        };
        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(value["type"], "local");
        assert_eq!(value["costHint"], "$0");
    }
}
