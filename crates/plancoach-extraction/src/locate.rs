//! Finding a JSON object inside free text.
//!
//! Candidates are tried in order: fenced code blocks, then each top-level
//! balanced `{...}` span, then the span from the first `{` to the last `}`.
//! Each candidate gets one trailing-comma repair if it fails to decode. The
//! first candidate carrying an advisory key wins; otherwise the first object
//! that decodes at all.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

/// Fenced block with an optional info string; captures the body.
static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_+-]*[ \t]*\r?\n(.*?)```").expect("static regex is valid")
});

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Located {
    pub object: Map<String, Value>,
    /// Trailing commas had to be removed.
    pub repaired: bool,
}

pub(crate) fn locate_object(text: &str) -> Option<Located> {
    let fenced = FENCED_BLOCK
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str());

    let mut first_decoded = None;
    for located in fenced
        .chain(balanced_objects(text))
        .chain(outer_span(text))
        .filter_map(decode_object)
    {
        if has_advisory_key(&located.object) {
            return Some(located);
        }
        first_decoded.get_or_insert(located);
    }
    first_decoded
}

const ADVISORY_KEYS: [&str; 4] = [
    "root_cause_summary",
    "rootCauseSummary",
    "relaxation_suggestions",
    "relaxationSuggestions",
];

fn has_advisory_key(object: &Map<String, Value>) -> bool {
    ADVISORY_KEYS.iter().any(|key| object.contains_key(*key))
}

fn decode_object(candidate: &str) -> Option<Located> {
    let candidate = candidate.trim();
    if let Ok(Value::Object(object)) = serde_json::from_str(candidate) {
        return Some(Located {
            object,
            repaired: false,
        });
    }

    let repaired = remove_trailing_commas(candidate);
    match serde_json::from_str(&repaired) {
        Ok(Value::Object(object)) => Some(Located {
            object,
            repaired: true,
        }),
        _ => None,
    }
}

/// Top-level `{...}` spans in order of appearance.
///
/// Quotes only count inside a span, so apostrophes in surrounding prose do
/// not confuse the scan. A span that never closes is abandoned and the scan
/// resumes at the next `{` after its opening brace.
fn balanced_objects(text: &str) -> impl Iterator<Item = &str> {
    let mut spans = Vec::new();
    let mut from = 0usize;

    while let Some(offset) = text[from..].find('{') {
        let start = from + offset;
        match closing_brace(&text[start..]) {
            Some(len) => {
                spans.push(&text[start..start + len]);
                from = start + len;
            }
            None => from = start + 1,
        }
    }

    spans.into_iter()
}

/// Byte length of the balanced span opening at `span[0]`, if it closes.
fn closing_brace(span: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in span.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

fn outer_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Drop commas that directly precede `}` or `]`, outside string literals.
pub(crate) fn remove_trailing_commas(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    let mut pending_comma: Option<String> = None;
    let mut in_string = false;
    let mut escaped = false;

    for c in json.chars() {
        if in_string {
            out.push(c);
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        if let Some(held) = pending_comma.as_mut() {
            if c.is_whitespace() {
                held.push(c);
                continue;
            }
            let held = pending_comma.take().unwrap_or_default();
            if c == '}' || c == ']' {
                // Keep the whitespace, lose the comma
                out.push_str(&held[1..]);
            } else {
                out.push_str(&held);
            }
        }

        match c {
            ',' => pending_comma = Some(String::from(",")),
            '"' => {
                in_string = true;
                out.push(c);
            }
            _ => out.push(c),
        }
    }

    if let Some(held) = pending_comma {
        out.push_str(&held);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(located: &Located) -> Option<&str> {
        located.object.get("root_cause_summary")?.as_str()
    }

    #[test]
    fn test_bare_object() {
        let located = locate_object(r#"{"root_cause_summary": "gap"}"#).unwrap();
        assert_eq!(summary(&located), Some("gap"));
        assert!(!located.repaired);
    }

    #[test]
    fn test_fenced_block_preferred_over_prose_braces() {
        let text = "Consider {weekend} days.\n```json\n{\"root_cause_summary\": \"fenced\"}\n```\n";
        let located = locate_object(text).unwrap();
        assert_eq!(summary(&located), Some("fenced"));
    }

    #[test]
    fn test_object_wrapped_in_prose() {
        let text = "Here's my analysis: {\"root_cause_summary\": \"a } inside\"} Hope it helps!";
        let located = locate_object(text).unwrap();
        assert_eq!(summary(&located), Some("a } inside"));
    }

    #[test]
    fn test_skips_undecodable_first_span() {
        let text = "Set {x} first, then {\"root_cause_summary\": \"second\"}";
        let located = locate_object(text).unwrap();
        assert_eq!(summary(&located), Some("second"));
    }

    #[test]
    fn test_echoed_input_object_does_not_shadow_advisory() {
        let text = r#"Looking at day data {"day": 1, "capacity_gap": 1} I conclude:
{"root_cause_summary": "Day 1 short by one", "relaxation_suggestions": []}"#;
        let located = locate_object(text).unwrap();
        assert_eq!(summary(&located), Some("Day 1 short by one"));
    }

    #[test]
    fn test_unclosed_brace_in_prose_is_skipped() {
        let text = "Set min_cover = {3 to start.\n{\"root_cause_summary\": \"x\", \"relaxation_suggestions\": []}";
        let located = locate_object(text).unwrap();
        assert_eq!(summary(&located), Some("x"));
    }

    #[test]
    fn test_falls_back_to_first_decodable_object() {
        let located = locate_object(r#"noise {"day": 1} then {"day": 2}"#).unwrap();
        assert_eq!(located.object.get("day").and_then(Value::as_u64), Some(1));
    }

    #[test]
    fn test_trailing_commas_repaired() {
        let text = "{\"critical_issues\": [\"a\", \"b\",], \"root_cause_summary\": \"x\",\n}";
        let located = locate_object(text).unwrap();
        assert!(located.repaired);
        assert_eq!(summary(&located), Some("x"));
    }

    #[test]
    fn test_comma_inside_string_untouched() {
        assert_eq!(
            remove_trailing_commas(r#"{"a": "x,]", "b": [1, 2 , ] }"#),
            r#"{"a": "x,]", "b": [1, 2  ] }"#
        );
    }

    #[test]
    fn test_no_object() {
        assert!(locate_object("").is_none());
        assert!(locate_object("Just relax the weekend rule.").is_none());
        assert!(locate_object("[1, 2, 3]").is_none());
        assert!(locate_object("} backwards {").is_none());
    }
}
