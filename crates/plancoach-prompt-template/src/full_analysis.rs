use plancoach_utils::types::{ConstraintViolation, DayDiagnostic, DiagnosticReport};

use crate::numbered_list;

const KEY_CONSTRAINTS: &str = "\
1. Maximum 5 consecutive work days
2. Minimum 2 consecutive OFF days (44h rest period)
3. No weekend work (all employees OFF on Sat/Sun)
4. Interns must have 'cours' shift on school days
5. Holiday requests must be honored
6. Contract hours must be respected (varying between 32-40h/week)";

const TASK: &str = "\
Analyze this failed optimization and provide:

1. **Root Cause Analysis**: What is the fundamental reason this optimization is INFEASIBLE?

2. **Critical Issues**: List 3-5 critical issues (capacity gaps, conflicting constraints, etc.)

3. **Relaxation Strategy Ladder**: Suggest 4-6 constraint relaxations in priority order (1=try first):
   - What constraint to relax
   - How to relax it
   - Expected impact
   - Risk level (low/medium/high)
   - Specific implementation guidance

4. **Long-term Recommendations**: Suggest 2-3 structural improvements to prevent future failures";

const RESPONSE_CONTRACT: &str = r#"Respond with a single valid JSON object and nothing else. Use exactly these fields:

- root_cause_summary (string): 1-2 sentence summary of why the problem is INFEASIBLE
- critical_issues (array of strings): the most important issues
- relaxation_suggestions (array of objects), ordered by priority, each with:
  - priority (integer): 1 = try first, strictly increasing
  - constraint_to_relax (string): name of the constraint
  - relaxation_strategy (string): how to relax it
  - description (string): detailed explanation
  - expected_impact (string): what this will achieve
  - implementation_code (string or null): code snippet if applicable
  - risk_level (string): one of "low", "medium", "high"
- long_term_recommendations (array of strings): structural improvements

Example:

{
  "root_cause_summary": "Weekend days need 3 staff but at most 2 are available once the no-weekend-work rule applies.",
  "critical_issues": [
    "Saturday 1 and Sunday 2 have a capacity gap of 1-2 staff",
    "The no-weekend-work rule removes every employee from weekend coverage"
  ],
  "relaxation_suggestions": [
    {
      "priority": 1,
      "constraint_to_relax": "Minimum Daily Coverage",
      "relaxation_strategy": "Lower weekend minimum coverage from 3 to 2",
      "description": "Weekend demand exceeds the available pool; a lower floor makes the weekend satisfiable.",
      "expected_impact": "Removes the weekend capacity gap",
      "implementation_code": "min_coverage[day] = 2 if is_weekend(day) else 3",
      "risk_level": "low"
    }
  ],
  "long_term_recommendations": [
    "Hire or train one additional weekend-capable employee"
  ]
}"#;

/// Prompt for the full-analysis path.
///
/// Days with a non-zero capacity gap come first, largest gap first, ties by
/// ascending day. All other days are folded into one summary line.
#[must_use]
pub fn build_full_analysis_prompt(report: &DiagnosticReport) -> String {
    let (critical, remaining) = partition_days(&report.daily_diagnostics);

    let mut sections = vec![
        "You are an expert in constraint programming and shift scheduling optimization \
         using Google OR-Tools CP-SAT solver."
            .to_string(),
        "# CONTEXT: Failed Planning Optimization".to_string(),
        format!(
            "## Planning Details\n\
             - Month: {}/{}\n\
             - Planning ID: {}\n\
             - Time Limit: {}s\n\
             - Failure Message: \"{}\"",
            report.month,
            report.year,
            report.planning_id,
            report.time_limit_seconds,
            report.failure_message,
        ),
        format!(
            "## Strategies Already Attempted\n{}",
            numbered_list(&report.strategies_attempted)
        ),
        format!(
            "## Employee Pool\n\
             - Total Employees: {}\n\
             - Interns: {}\n\
             - Manual Shifts Already Set: {}",
            report.total_employees(),
            report.intern_count(),
            report.manual_shift_count,
        ),
        format!(
            "## Coverage Requirements\n\
             - Minimum Daily Coverage: {}\n\
             - Maximum Daily Coverage: {}",
            report.min_daily_coverage,
            report
                .max_daily_coverage
                .map_or_else(|| "None".to_string(), |max| max.to_string()),
        ),
        format!(
            "## Daily Capacity Analysis\n\
             Total days in month: {}\n\
             Critical days (capacity gap > 0): {}\n\
             Weekend days: {}",
            report.daily_diagnostics.len(),
            critical.len(),
            report.weekend_day_count(),
        ),
        format!("### Critical Days\n{}", format_critical_days(&critical)),
        format!("### Remaining Days\n{}", summarize_days(&remaining)),
        format!(
            "## Detected Constraint Violations\n{}",
            format_violations(report.constraint_violations.as_deref())
        ),
        format!("## Key Constraints (Luxembourg Labor Law)\n{KEY_CONSTRAINTS}"),
    ];

    if let Some(notes) = report.notes.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        sections.push(format!("## Additional Notes\n{notes}"));
    }

    sections.push(format!("# YOUR TASK\n\n{TASK}"));
    sections.push(format!("# OUTPUT FORMAT\n\n{RESPONSE_CONTRACT}"));
    sections.push(
        "Think step by step. Consider the capacity gaps, constraint interactions, \
         and Luxembourg labor law requirements."
            .to_string(),
    );

    let mut prompt = sections.join("\n\n");
    prompt.push('\n');
    prompt
}

/// Split into (gap > 0 sorted by gap desc then day asc, the rest by day asc).
fn partition_days(days: &[DayDiagnostic]) -> (Vec<&DayDiagnostic>, Vec<&DayDiagnostic>) {
    let (mut critical, mut remaining): (Vec<_>, Vec<_>) = days.iter().partition(|d| d.gap() > 0);
    critical.sort_by(|a, b| b.gap().cmp(&a.gap()).then(a.day.cmp(&b.day)));
    remaining.sort_by_key(|d| d.day);
    (critical, remaining)
}

fn format_critical_days(days: &[&DayDiagnostic]) -> String {
    if days.is_empty() {
        return "None".to_string();
    }
    days.iter()
        .map(|d| {
            format!(
                "Day {} ({}): Need {}, Available {}, GAP: {}",
                d.day,
                d.weekday,
                d.required_coverage,
                d.effective_capacity,
                d.gap()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn span(values: impl Iterator<Item = u32> + Clone) -> String {
    let min = values.clone().min().unwrap_or_default();
    let max = values.max().unwrap_or_default();
    if min == max {
        min.to_string()
    } else {
        format!("{min}-{max}")
    }
}

fn summarize_days(days: &[&DayDiagnostic]) -> String {
    if days.is_empty() {
        return "None".to_string();
    }
    let listed = days
        .iter()
        .map(|d| format!("{} ({})", d.day, d.weekday))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "{} days without gap: {listed}. Required {}, effective capacity {}.",
        days.len(),
        span(days.iter().map(|d| d.required_coverage)),
        span(days.iter().map(|d| d.effective_capacity)),
    )
}

fn format_violations(violations: Option<&[ConstraintViolation]>) -> String {
    match violations {
        None | Some([]) => "None detected".to_string(),
        Some(violations) => violations
            .iter()
            .map(|v| {
                format!(
                    "- [{}] {}: {}",
                    v.severity.to_uppercase(),
                    v.constraint_type,
                    v.description
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}
