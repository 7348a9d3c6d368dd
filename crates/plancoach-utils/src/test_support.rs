//! Fixtures shared by unit and integration tests.

use crate::types::{
    ConstraintViolation, DayDiagnostic, DiagnosticReport, EmployeeSummary,
};

const ALNUM: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

fn make_from(alphabet: &[u8], len: usize, seed: usize) -> String {
    let mut output = String::with_capacity(len);
    let mut idx = seed % alphabet.len();

    for _ in 0..len {
        output.push(alphabet[idx] as char);
        idx = (idx + 7) % alphabet.len();
    }

    output
}

/// Deterministic key-shaped string; never a real credential.
#[must_use]
pub fn fake_api_key(seed: usize) -> String {
    format!("sk-{}", make_from(ALNUM, 40, seed))
}

#[must_use]
pub fn day(day: u32, weekday: &str, required: u32, effective: u32) -> DayDiagnostic {
    let is_weekend = matches!(weekday, "Sat" | "Sun" | "Saturday" | "Sunday");
    DayDiagnostic {
        day,
        weekday: weekday.to_string(),
        required_coverage: required,
        available_employees: effective,
        intern_school_count: 0,
        holiday_requests: 0,
        effective_capacity: effective,
        capacity_gap: Some(required.saturating_sub(effective)),
        is_weekend,
        is_holiday: false,
    }
}

#[must_use]
pub fn employee(id: i64, abbreviation: &str, is_intern: bool) -> EmployeeSummary {
    EmployeeSummary {
        id,
        abbreviation: abbreviation.to_string(),
        contract_hours_per_week: if is_intern { 20.0 } else { 40.0 },
        contract_hours_per_day: 8.0,
        is_intern,
        school_days: is_intern.then(|| vec![0, 1]),
    }
}

/// A small infeasible month: two short weekend days and one short weekday.
#[must_use]
pub fn sample_report() -> DiagnosticReport {
    DiagnosticReport {
        planning_id: 42,
        month: 3,
        year: 2025,
        failure_message: "Solver returned INFEASIBLE after 120s".to_string(),
        time_limit_seconds: 120,
        strategies_attempted: vec![
            "full_constraints".to_string(),
            "relaxed_rest_periods".to_string(),
        ],
        employees: vec![
            employee(1, "AB", false),
            employee(2, "CD", false),
            employee(3, "EF", true),
        ],
        daily_diagnostics: vec![
            day(1, "Sat", 3, 1),
            day(2, "Sun", 3, 2),
            day(3, "Mon", 2, 3),
            day(4, "Tue", 3, 1),
            day(5, "Wed", 2, 2),
        ],
        min_daily_coverage: 2,
        max_daily_coverage: Some(4),
        constraint_violations: Some(vec![ConstraintViolation {
            constraint_type: "weekend_coverage".to_string(),
            severity: "critical".to_string(),
            description: "Not enough staff on weekends".to_string(),
            affected_employees: None,
            affected_days: Some(vec![1, 2]),
        }]),
        manual_shift_count: 0,
        notes: None,
    }
}
