// Input sanitizers

use serde_json::Value;

/// Trim, strip control characters and strip `<` / `>` from strings.
///
/// Non-string values pass through unchanged.
pub fn default_sanitize(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(clean(s)),
        other => other.clone(),
    }
}

/// Default sanitizer followed by lowercasing.
pub fn lowercase_trim(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(clean(s).to_lowercase()),
        other => other.clone(),
    }
}

/// Remove common phone number separators.
pub fn strip_phone_separators(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(
            clean(s)
                .chars()
                .filter(|c| !matches!(c, ' ' | '-' | '(' | ')' | '.'))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn clean(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_control() && *c != '<' && *c != '>')
        .collect::<String>()
        .trim()
        .to_string()
}
