//! Field-by-field coercion of a decoded reply object.

use plancoach_utils::types::{ParseDiagnostic, RelaxationSuggestion, RiskLevel};
use serde_json::{Map, Value};

/// Look up `snake_key`, falling back to its camelCase spelling.
pub(crate) fn field<'a>(object: &'a Map<String, Value>, snake_key: &str) -> Option<&'a Value> {
    object
        .get(snake_key)
        .or_else(|| object.get(&to_camel(snake_key)))
}

fn to_camel(snake: &str) -> String {
    let mut out = String::with_capacity(snake.len());
    let mut upper = false;
    for c in snake.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Scalar as text; `None` for null, arrays and objects.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub(crate) fn text_field(
    object: &Map<String, Value>,
    key: &str,
    path: &str,
    diagnostics: &mut Vec<ParseDiagnostic>,
) -> String {
    match field(object, key).and_then(scalar_text) {
        Some(text) => text,
        None => {
            diagnostics.push(ParseDiagnostic::MissingField {
                field: path.to_string(),
            });
            String::new()
        }
    }
}

/// A list of strings, accepting a lone scalar as a one-element list.
pub(crate) fn string_list(
    object: &Map<String, Value>,
    key: &str,
    diagnostics: &mut Vec<ParseDiagnostic>,
) -> Vec<String> {
    match field(object, key) {
        None | Some(Value::Null) => {
            diagnostics.push(ParseDiagnostic::MissingField {
                field: key.to_string(),
            });
            Vec::new()
        }
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::Object(_) | Value::Array(_) => Some(item.to_string()),
                other => scalar_text(other),
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Some(scalar) => {
            diagnostics.push(ParseDiagnostic::ScalarCoercedToList {
                field: key.to_string(),
            });
            scalar_text(scalar)
                .or_else(|| Some(scalar.to_string()))
                .into_iter()
                .filter(|s| !s.is_empty())
                .collect()
        }
    }
}

/// Usable priority: a positive integer, possibly written as `2.0` or `"2"`.
fn priority_of(value: Option<&Value>) -> Option<u32> {
    let raw = match value? {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0 && *f >= 1.0)
                .map(|f| f as u64)
        })?,
        Value::String(s) => s.trim().parse::<u64>().ok()?,
        _ => return None,
    };
    u32::try_from(raw).ok().filter(|p| *p >= 1)
}

/// One suggestion before priority normalization.
#[derive(Debug, Clone)]
pub(crate) struct RawSuggestion {
    /// Position in the reply's array.
    pub index: usize,
    pub priority: Option<u32>,
    pub suggestion: RelaxationSuggestion,
}

pub(crate) fn suggestion(
    index: usize,
    object: &Map<String, Value>,
    diagnostics: &mut Vec<ParseDiagnostic>,
) -> RawSuggestion {
    let path = |name: &str| format!("relaxation_suggestions[{index}].{name}");

    let risk_level = match field(object, "risk_level") {
        None | Some(Value::Null) => {
            diagnostics.push(ParseDiagnostic::MissingField {
                field: path("risk_level"),
            });
            RiskLevel::Medium
        }
        Some(value) => {
            let text = scalar_text(value).unwrap_or_else(|| value.to_string());
            RiskLevel::parse(&text).unwrap_or_else(|| {
                diagnostics.push(ParseDiagnostic::RiskLevelCoerced {
                    index,
                    original: text,
                });
                RiskLevel::Medium
            })
        }
    };

    let implementation_code = field(object, "implementation_code")
        .and_then(scalar_text)
        .filter(|code| !code.is_empty());

    RawSuggestion {
        index,
        priority: priority_of(field(object, "priority")),
        suggestion: RelaxationSuggestion {
            priority: 0,
            constraint_to_relax: text_field(
                object,
                "constraint_to_relax",
                &path("constraint_to_relax"),
                diagnostics,
            ),
            relaxation_strategy: text_field(
                object,
                "relaxation_strategy",
                &path("relaxation_strategy"),
                diagnostics,
            ),
            description: text_field(object, "description", &path("description"), diagnostics),
            expected_impact: text_field(
                object,
                "expected_impact",
                &path("expected_impact"),
                diagnostics,
            ),
            implementation_code,
            risk_level,
        },
    }
}

/// Entries of `relaxation_suggestions`, dropping anything that is not an object.
pub(crate) fn suggestions(
    value: Option<&Value>,
    diagnostics: &mut Vec<ParseDiagnostic>,
) -> Vec<RawSuggestion> {
    let items: Vec<&Value> = match value {
        None | Some(Value::Null) => {
            diagnostics.push(ParseDiagnostic::MissingField {
                field: "relaxation_suggestions".to_string(),
            });
            return Vec::new();
        }
        Some(Value::Array(items)) => items.iter().collect(),
        Some(single) => {
            diagnostics.push(ParseDiagnostic::ScalarCoercedToList {
                field: "relaxation_suggestions".to_string(),
            });
            vec![single]
        }
    };

    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match item {
            Value::Object(object) => Some(suggestion(index, object, diagnostics)),
            other => {
                diagnostics.push(ParseDiagnostic::SuggestionDropped {
                    index,
                    reason: format!("expected an object, found {}", kind_name(other)),
                });
                None
            }
        })
        .collect()
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Assign final priorities.
///
/// A strictly increasing sequence is kept. Entries without a usable
/// priority follow the numbered ones. Anything else, including a tail that
/// would not fit in `u32`, is stable-sorted by (priority, position) and
/// renumbered from 1.
pub(crate) fn normalize_priorities(
    raw: Vec<RawSuggestion>,
    diagnostics: &mut Vec<ParseDiagnostic>,
) -> Vec<RelaxationSuggestion> {
    let (mut numbered, unnumbered): (Vec<_>, Vec<_>) =
        raw.into_iter().partition(|r| r.priority.is_some());

    let original: Vec<u32> = numbered.iter().filter_map(|r| r.priority).collect();
    let increasing = original.windows(2).all(|w| w[0] < w[1]);

    for r in &unnumbered {
        diagnostics.push(ParseDiagnostic::PriorityAssigned { index: r.index });
    }

    // Appending after the last priority must not run past u32::MAX
    let last = original.last().copied().unwrap_or(0);
    let fits = u32::try_from(unnumbered.len())
        .ok()
        .and_then(|extra| last.checked_add(extra))
        .is_some();

    if increasing && fits {
        return numbered
            .into_iter()
            .map(|r| (r.priority.unwrap_or_default(), r.suggestion))
            .chain(
                unnumbered
                    .into_iter()
                    .zip(1u32..)
                    .map(|(r, step)| (last + step, r.suggestion)),
            )
            .map(|(priority, mut suggestion)| {
                suggestion.priority = priority;
                suggestion
            })
            .collect();
    }

    diagnostics.push(ParseDiagnostic::PrioritiesRenumbered { original });
    numbered.sort_by_key(|r| (r.priority, r.index));

    numbered
        .into_iter()
        .chain(unnumbered)
        .zip(1u32..)
        .map(|(r, priority)| {
            let mut suggestion = r.suggestion;
            suggestion.priority = priority;
            suggestion
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    fn raw(index: usize, priority: Option<u32>) -> RawSuggestion {
        let mut diagnostics = Vec::new();
        let mut s = suggestion(index, &object(json!({"constraint_to_relax": format!("c{index}")})), &mut diagnostics);
        s.priority = priority;
        s
    }

    fn priorities(list: &[RelaxationSuggestion]) -> Vec<u32> {
        list.iter().map(|s| s.priority).collect()
    }

    fn names(list: &[RelaxationSuggestion]) -> Vec<&str> {
        list.iter().map(|s| s.constraint_to_relax.as_str()).collect()
    }

    #[test]
    fn test_camel_case_fallback() {
        let obj = object(json!({"rootCauseSummary": "camel"}));
        assert_eq!(field(&obj, "root_cause_summary"), Some(&json!("camel")));
        assert_eq!(to_camel("long_term_recommendations"), "longTermRecommendations");
    }

    #[test]
    fn test_string_list_coercions() {
        let mut diags = Vec::new();
        let obj = object(json!({"a": "single", "b": ["x", 3, "", {"k": 1}]}));

        assert_eq!(string_list(&obj, "a", &mut diags), vec!["single"]);
        assert_eq!(
            string_list(&obj, "b", &mut diags),
            vec!["x", "3", r#"{"k":1}"#]
        );
        assert!(string_list(&obj, "missing", &mut diags).is_empty());

        assert_eq!(
            diags,
            vec![
                ParseDiagnostic::ScalarCoercedToList { field: "a".to_string() },
                ParseDiagnostic::MissingField { field: "missing".to_string() },
            ]
        );
    }

    #[test]
    fn test_priority_forms() {
        assert_eq!(priority_of(Some(&json!(2))), Some(2));
        assert_eq!(priority_of(Some(&json!(2.0))), Some(2));
        assert_eq!(priority_of(Some(&json!("3"))), Some(3));
        assert_eq!(priority_of(Some(&json!(0))), None);
        assert_eq!(priority_of(Some(&json!(-1))), None);
        assert_eq!(priority_of(Some(&json!(1.5))), None);
        assert_eq!(priority_of(Some(&json!("high"))), None);
        assert_eq!(priority_of(None), None);
    }

    #[test]
    fn test_suggestion_defaults_and_risk_coercion() {
        let mut diags = Vec::new();
        let s = suggestion(
            0,
            &object(json!({"priority": 1, "constraintToRelax": "Weekend", "risk_level": "extreme"})),
            &mut diags,
        );

        assert_eq!(s.priority, Some(1));
        assert_eq!(s.suggestion.constraint_to_relax, "Weekend");
        assert_eq!(s.suggestion.description, "");
        assert_eq!(s.suggestion.risk_level, RiskLevel::Medium);
        assert!(diags.contains(&ParseDiagnostic::RiskLevelCoerced {
            index: 0,
            original: "extreme".to_string()
        }));
        assert!(diags.contains(&ParseDiagnostic::MissingField {
            field: "relaxation_suggestions[0].description".to_string()
        }));
    }

    #[test]
    fn test_risk_level_case_insensitive() {
        let mut diags = Vec::new();
        let s = suggestion(0, &object(json!({"risk_level": "HIGH"})), &mut diags);
        assert_eq!(s.suggestion.risk_level, RiskLevel::High);
        assert!(!diags.iter().any(|d| matches!(d, ParseDiagnostic::RiskLevelCoerced { .. })));
    }

    #[test]
    fn test_non_object_entries_dropped() {
        let mut diags = Vec::new();
        let list = json!([{"priority": 1}, "free text", null]);
        let parsed = suggestions(Some(&list), &mut diags);

        assert_eq!(parsed.len(), 1);
        assert!(diags.contains(&ParseDiagnostic::SuggestionDropped {
            index: 1,
            reason: "expected an object, found a string".to_string()
        }));
        assert!(diags.contains(&ParseDiagnostic::SuggestionDropped {
            index: 2,
            reason: "expected an object, found null".to_string()
        }));
    }

    #[test]
    fn test_sparse_increasing_kept() {
        let mut diags = Vec::new();
        let out = normalize_priorities(vec![raw(0, Some(2)), raw(1, Some(5)), raw(2, Some(9))], &mut diags);
        assert_eq!(priorities(&out), vec![2, 5, 9]);
        assert!(diags.is_empty());
    }

    #[test]
    fn test_out_of_order_sorted_and_renumbered() {
        let mut diags = Vec::new();
        let out = normalize_priorities(vec![raw(0, Some(3)), raw(1, Some(1)), raw(2, Some(2))], &mut diags);

        assert_eq!(priorities(&out), vec![1, 2, 3]);
        assert_eq!(names(&out), vec!["c1", "c2", "c0"]);
        assert_eq!(
            diags,
            vec![ParseDiagnostic::PrioritiesRenumbered { original: vec![3, 1, 2] }]
        );
    }

    #[test]
    fn test_unnumbered_after_max_priority_forces_renumbering() {
        let mut diags = Vec::new();
        let out = normalize_priorities(vec![raw(0, Some(u32::MAX)), raw(1, None)], &mut diags);

        assert_eq!(priorities(&out), vec![1, 2]);
        assert_eq!(names(&out), vec!["c0", "c1"]);
        assert!(diags.contains(&ParseDiagnostic::PrioritiesRenumbered {
            original: vec![u32::MAX]
        }));
    }

    #[test]
    fn test_max_priority_alone_is_kept() {
        let mut diags = Vec::new();
        let out = normalize_priorities(vec![raw(0, Some(7)), raw(1, Some(u32::MAX))], &mut diags);
        assert_eq!(priorities(&out), vec![7, u32::MAX]);
        assert!(diags.is_empty());
    }

    #[test]
    fn test_duplicates_keep_reply_order() {
        let mut diags = Vec::new();
        let out = normalize_priorities(vec![raw(0, Some(1)), raw(1, Some(1)), raw(2, Some(1))], &mut diags);
        assert_eq!(priorities(&out), vec![1, 2, 3]);
        assert_eq!(names(&out), vec!["c0", "c1", "c2"]);
    }

    #[test]
    fn test_unnumbered_placed_last() {
        let mut diags = Vec::new();
        let out = normalize_priorities(vec![raw(0, None), raw(1, Some(1)), raw(2, Some(4))], &mut diags);

        assert_eq!(priorities(&out), vec![1, 4, 5]);
        assert_eq!(names(&out), vec!["c1", "c2", "c0"]);
        assert_eq!(diags, vec![ParseDiagnostic::PriorityAssigned { index: 0 }]);
    }

    #[test]
    fn test_unnumbered_with_disorder() {
        let mut diags = Vec::new();
        let out = normalize_priorities(vec![raw(0, Some(2)), raw(1, None), raw(2, Some(1))], &mut diags);

        assert_eq!(priorities(&out), vec![1, 2, 3]);
        assert_eq!(names(&out), vec!["c2", "c0", "c1"]);
        assert_eq!(diags.len(), 2);
    }
}
