//! Config redaction: produce safe-to-display config snapshots by masking
//! secrets (bot tokens and the like).

use serde_json::Value;

/// Keys whose string values are secrets.
static SENSITIVE_KEYS: &[&str] = &[
    "botToken",
    "bot_token",
    "token",
    "secret",
    "password",
    "apiKey",
    "api_key",
];

/// Redact a config JSON value, masking every sensitive field.
///
/// The first four characters are kept as a hint (Telegram tokens start with
/// the bot id, which is not secret on its own).
pub fn redact(value: &Value) -> Value {
    redact_recursive(value, "")
}

fn is_sensitive_key(key: &str) -> bool {
    SENSITIVE_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

fn redact_recursive(value: &Value, key: &str) -> Value {
    match value {
        Value::String(s) if is_sensitive_key(key) && !s.is_empty() => {
            let hint: String = s.chars().take(4).collect();
            if s.chars().count() > 4 {
                Value::String(format!("{hint}***"))
            } else {
                Value::String("***".to_string())
            }
        }
        Value::Array(arr) => Value::Array(arr.iter().map(|v| redact_recursive(v, key)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), redact_recursive(v, k)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Collect all field paths that `redact` would mask (for diagnostics).
pub fn collect_redacted_paths(value: &Value) -> Vec<String> {
    let mut paths = Vec::new();
    collect_paths_recursive(value, "", "", &mut paths);
    paths
}

fn collect_paths_recursive(value: &Value, key: &str, path: &str, out: &mut Vec<String>) {
    match value {
        Value::String(s) if !s.is_empty() && is_sensitive_key(key) => out.push(path.to_string()),
        Value::Array(arr) => {
            for (i, v) in arr.iter().enumerate() {
                collect_paths_recursive(v, key, &format!("{path}[{i}]"), out);
            }
        }
        Value::Object(map) => {
            for (k, v) in map {
                let child_path = if path.is_empty() {
                    k.clone()
                } else {
                    format!("{path}.{k}")
                };
                collect_paths_recursive(v, k, &child_path, out);
            }
        }
        _ => {}
    }
}
