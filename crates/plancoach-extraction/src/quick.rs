use plancoach_utils::error::ParseError;

/// Whitespace-normalize a free-text reply.
///
/// Line endings become `\n`, trailing spaces go, and runs of blank lines
/// collapse to one.
pub(crate) fn normalize_text(raw: &str) -> Result<String, ParseError> {
    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");

    let mut lines: Vec<&str> = Vec::new();
    let mut previous_blank = false;
    for line in unified.lines().map(str::trim_end) {
        let blank = line.is_empty();
        if blank && previous_blank {
            continue;
        }
        lines.push(line);
        previous_blank = blank;
    }

    let text = lines.join("\n").trim().to_string();
    if text.is_empty() {
        return Err(ParseError::empty_reply(raw));
    }
    Ok(text)
}
