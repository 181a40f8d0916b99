//! Helpers for turning block payloads into prompt text and parsing
//! tag arrays out of model output.

use serde_json::Value;

/// Flattens a block payload into text for prompting. Only the fields
/// the models care about; everything else stays out of the prompt.
pub fn payload_to_text(payload: &Value) -> String {
    let mut parts: Vec<String> = Vec::new();

    let text_field = |key: &str, label: &str, parts: &mut Vec<String>| {
        if let Some(v) = payload.get(key).and_then(Value::as_str) {
            parts.push(format!("{label}: {v}"));
        }
    };

    text_field("title", "Title", &mut parts);
    text_field("role", "Role", &mut parts);
    text_field("company", "Company", &mut parts);
    text_field("name", "Project", &mut parts);

    if let Some(bullets) = payload.get("bullets").and_then(Value::as_array) {
        parts.push("Bullets:".to_string());
        for bullet in bullets {
            if let Some(text) = bullet.as_str() {
                parts.push(format!("- {text}"));
            }
        }
    }

    if let Some(tech) = payload.get("tech").and_then(Value::as_array) {
        let joined: Vec<&str> = tech.iter().filter_map(Value::as_str).collect();
        parts.push(format!("Tech Stack: {}", joined.join(", ")));
    }

    match payload.get("skills") {
        Some(Value::Object(map)) => {
            for (category, items) in map {
                if let Some(list) = items.as_array() {
                    let joined: Vec<&str> = list.iter().filter_map(Value::as_str).collect();
                    parts.push(format!("{category}: {}", joined.join(", ")));
                }
            }
        }
        Some(Value::Array(list)) => {
            let joined: Vec<&str> = list.iter().filter_map(Value::as_str).collect();
            parts.push(format!("Skills: {}", joined.join(", ")));
        }
        _ => {}
    }

    parts.join("\n")
}

/// Extracts the first JSON array from model output and returns its
/// string elements, lowercased and trimmed. Unparseable output yields
/// an empty list rather than an error.
pub fn parse_tag_array(response: &str) -> Vec<String> {
    let Some(raw) = extract_json_array(response) else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<Value>>(raw) {
        Ok(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_lowercase()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Err(_) => Vec::new(),
    }
}

fn extract_json_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (end > start).then(|| &text[start..=end])
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let stripped = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .map(str::trim_start);
    match stripped {
        Some(inner) => inner
            .strip_suffix("```")
            .map(str::trim)
            .unwrap_or(inner),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_to_text_experience_fields() {
        let payload = json!({
            "title": "SDE II",
            "company": "Amazon",
            "bullets": ["Built queues", "Cut latency"]
        });
        let text = payload_to_text(&payload);
        assert!(text.contains("Title: SDE II"));
        assert!(text.contains("Company: Amazon"));
        assert!(text.contains("- Built queues"));
    }

    #[test]
    fn test_payload_to_text_skills_map() {
        let payload = json!({"skills": {"Languages": ["Rust", "Go"]}});
        assert_eq!(payload_to_text(&payload), "Languages: Rust, Go");
    }

    #[test]
    fn test_parse_tag_array_lowercases_and_trims() {
        let out = parse_tag_array("Here you go: [\"Python\", \" AWS \", \"microservices\"]");
        assert_eq!(out, vec!["python", "aws", "microservices"]);
    }

    #[test]
    fn test_parse_tag_array_drops_non_strings_and_garbage() {
        assert_eq!(parse_tag_array("[1, \"rust\", null]"), vec!["rust"]);
        assert!(parse_tag_array("no json here").is_empty());
        assert!(parse_tag_array("[not valid").is_empty());
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(
            strip_code_fences("```json\n{\"key\": \"value\"}\n```"),
            "{\"key\": \"value\"}"
        );
        assert_eq!(
            strip_code_fences("```\n{\"key\": \"value\"}\n```"),
            "{\"key\": \"value\"}"
        );
        assert_eq!(strip_code_fences("{\"key\": \"value\"}"), "{\"key\": \"value\"}");
    }
}
