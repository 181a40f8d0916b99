//! LaTeX escaping and the bullet mini-markup formatter.

use serde_json::Value;

/// Escapes every LaTeX control character in a plain-text span.
pub fn escape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\textbackslash{}"),
            '&' => out.push_str("\\&"),
            '%' => out.push_str("\\%"),
            '$' => out.push_str("\\$"),
            '#' => out.push_str("\\#"),
            '_' => out.push_str("\\_"),
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            '~' => out.push_str("\\textasciitilde{}"),
            '^' => out.push_str("\\textasciicircum{}"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escapes a JSON value. Lists are joined with ", " first (tech-stack
/// style fields); other non-strings are stringified.
pub fn escape_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => escape_latex(s),
        Value::Array(items) => {
            let joined = items
                .iter()
                .map(value_to_text)
                .collect::<Vec<_>>()
                .join(", ");
            escape_latex(&joined)
        }
        other => escape_latex(&other.to_string()),
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Formats a bullet: recognizes `**strong**` and `*emphasis*` spans,
/// escaping everything (span interiors included). Single left-to-right
/// pass, greedy on the first closing delimiter; the double marker is
/// checked before the single one so `**x**` is never read as two
/// adjacent emphasis spans. Unmatched delimiters are plain text.
pub fn format_inline(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i..].starts_with(b"**") {
            if let Some(end) = find_from(text, i + 2, "**") {
                out.push_str("\\textbf{");
                out.push_str(&escape_latex(&text[i + 2..end]));
                out.push('}');
                i = end + 2;
                continue;
            }
        }

        if bytes[i] == b'*' {
            if let Some(end) = find_from(text, i + 1, "*") {
                out.push_str("\\textit{");
                out.push_str(&escape_latex(&text[i + 1..end]));
                out.push('}');
                i = end + 1;
                continue;
            }
        }

        // Plain text up to the next delimiter candidate.
        let next_star = find_from(text, i, "*").unwrap_or(text.len());
        let end = if next_star == i { i + 1 } else { next_star };
        out.push_str(&escape_latex(&text[i..end]));
        i = end;
    }

    out
}

fn find_from(text: &str, start: usize, needle: &str) -> Option<usize> {
    text.get(start..)
        .and_then(|rest| rest.find(needle))
        .map(|pos| start + pos)
}
