//! Environment variable handling for config values.
//!
//! Two mechanisms:
//! - `${VAR_NAME}` references inside string values, resolved at load time.
//!   Only uppercase `[A-Z_][A-Z0-9_]*` names are matched; `$${VAR}` escapes
//!   to a literal `${VAR}`.
//! - Direct overrides: `BOT_TOKEN` and `ADMIN_CHAT_ID` replace the telegram
//!   token and operator chat id when set, so a bare environment is enough to
//!   run without any config file.

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::HashMap;

use crate::schema::{OperatorConfig, OrderDeskConfig, TelegramConfig};

/// Env var overriding `telegram.botToken`.
pub const BOT_TOKEN_VAR: &str = "BOT_TOKEN";
/// Env var overriding `operator.chatId`.
pub const ADMIN_CHAT_ID_VAR: &str = "ADMIN_CHAT_ID";

/// Matches `${VAR}` and the escaped form `$${VAR}`.
static ENV_VAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\$?)\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());

/// Error returned for missing env vars.
#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Snapshot of the process environment.
pub fn process_env() -> HashMap<String, String> {
    std::env::vars().collect()
}

/// Substitute `${VAR}` references in a config value tree using `env`.
///
/// Only string leaves are processed. Fails on the first reference to a var
/// that is unset or empty.
pub fn resolve_env_vars(value: &Value, env: &HashMap<String, String>) -> Result<Value> {
    substitute_value(value, env, "")
}

fn substitute_value(value: &Value, env: &HashMap<String, String>, path: &str) -> Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(substitute_string(s, env, path)?)),
        Value::Array(arr) => arr
            .iter()
            .enumerate()
            .map(|(i, v)| substitute_value(v, env, &format!("{path}[{i}]")))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut result = serde_json::Map::new();
            for (k, v) in map {
                let child_path = if path.is_empty() {
                    k.clone()
                } else {
                    format!("{path}.{k}")
                };
                result.insert(k.clone(), substitute_value(v, env, &child_path)?);
            }
            Ok(Value::Object(result))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_string(s: &str, env: &HashMap<String, String>, path: &str) -> Result<String> {
    if !s.contains("${") {
        return Ok(s.to_string());
    }

    let mut missing: Option<MissingEnvVarError> = None;
    let substituted = ENV_VAR_PATTERN.replace_all(s, |caps: &Captures| {
        let var_name = &caps[2];
        if !caps[1].is_empty() {
            return format!("${{{var_name}}}");
        }
        match env.get(var_name) {
            Some(val) if !val.is_empty() => val.clone(),
            _ => {
                missing.get_or_insert_with(|| MissingEnvVarError {
                    var_name: var_name.to_string(),
                    config_path: path.to_string(),
                });
                String::new()
            }
        }
    });

    if let Some(err) = missing {
        bail!(err);
    }
    Ok(substituted.into_owned())
}

/// Apply `BOT_TOKEN` / `ADMIN_CHAT_ID` overrides from `env`.
pub fn apply_env_overrides(
    mut config: OrderDeskConfig,
    env: &HashMap<String, String>,
) -> OrderDeskConfig {
    if let Some(token) = env.get(BOT_TOKEN_VAR).filter(|v| !v.trim().is_empty()) {
        config
            .telegram
            .get_or_insert_with(TelegramConfig::default)
            .bot_token = Some(token.trim().to_string());
    }
    if let Some(chat_id) = env.get(ADMIN_CHAT_ID_VAR).filter(|v| !v.trim().is_empty()) {
        config
            .operator
            .get_or_insert_with(OperatorConfig::default)
            .chat_id = Some(chat_id.trim().to_string());
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn substitutes_simple_var() {
        let v = json!({"telegram": {"botToken": "${TG_TOKEN}"}});
        let result = resolve_env_vars(&v, &env(&[("TG_TOKEN", "123:abc")])).unwrap();
        assert_eq!(result["telegram"]["botToken"], "123:abc");
    }

    #[test]
    fn error_on_missing_var_names_path() {
        let v = json!({"operator": {"chatId": "${OPS_CHAT}"}});
        let err = resolve_env_vars(&v, &HashMap::new()).unwrap_err().to_string();
        assert!(err.contains("OPS_CHAT"));
        assert!(err.contains("operator.chatId"));
    }

    #[test]
    fn escaped_reference_is_literal() {
        let v = json!({"k": "$${NOT_A_VAR} and ${REAL}"});
        let result = resolve_env_vars(&v, &env(&[("REAL", "yes")])).unwrap();
        assert_eq!(result["k"], "${NOT_A_VAR} and yes");
    }

    #[test]
    fn walks_arrays() {
        let v = json!({"catalog": [{"name": "${ITEM}"}]});
        let result = resolve_env_vars(&v, &env(&[("ITEM", "Tea")])).unwrap();
        assert_eq!(result["catalog"][0]["name"], "Tea");
    }

    #[test]
    fn overrides_fill_missing_sections() {
        let cfg = apply_env_overrides(
            OrderDeskConfig::default(),
            &env(&[("BOT_TOKEN", "t0k"), ("ADMIN_CHAT_ID", " 99 ")]),
        );
        assert_eq!(cfg.bot_token(), Some("t0k"));
        assert_eq!(cfg.operator_chat_id(), Some(99));
    }

    #[test]
    fn blank_override_is_ignored() {
        let mut cfg = OrderDeskConfig::default();
        cfg.telegram = Some(TelegramConfig {
            bot_token: Some("from-file".into()),
            ..Default::default()
        });
        let cfg = apply_env_overrides(cfg, &env(&[("BOT_TOKEN", "  ")]));
        assert_eq!(cfg.bot_token(), Some("from-file"));
    }
}
