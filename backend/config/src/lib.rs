//! `orderdesk-config` - OrderDesk runtime configuration.
//!
//! Provides:
//! - Typed config schema (telegram, operator, catalog, sessions, logging)
//! - YAML read/write
//! - `${ENV_VAR}` substitution and `BOT_TOKEN` / `ADMIN_CHAT_ID` overrides
//! - Default value application
//! - Validation (missing credentials are fatal)
//! - Config redaction for safe logging/display

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

// Re-export most-used types at crate root.
pub use defaults::apply_all_defaults;
pub use env::{apply_env_overrides, process_env, resolve_env_vars, MissingEnvVarError};
pub use io::{config_dir, config_file_path, load_config, parse_config, write_config};
pub use redact::{collect_redacted_paths, redact};
pub use schema::{
    CatalogItemConfig, LoggingConfig, OperatorConfig, OrderDeskConfig, SessionsConfig,
    TelegramConfig,
};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Load a config file and run it through [`prepare`] with the process environment.
///
/// This is the main entry point for loading a config at runtime. Any
/// validation error is returned as a hard failure: the process must not
/// start without a bot token and an operator destination.
pub async fn load_and_prepare(path: &Path) -> Result<OrderDeskConfig> {
    let raw_config = load_config(path).await?;
    prepare(raw_config, &process_env())
}

/// Env substitution, env overrides, defaults. No validation.
pub fn resolve(raw_config: OrderDeskConfig, env: &HashMap<String, String>) -> Result<OrderDeskConfig> {
    let value: Value = serde_json::to_value(&raw_config)
        .context("Failed to serialize config for processing")?;
    let value = resolve_env_vars(&value, env).context("Failed to resolve env vars in config")?;
    let config: OrderDeskConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;

    let config = apply_env_overrides(config, env);
    Ok(apply_all_defaults(config))
}

/// [`resolve`], then validate; any validation error is fatal.
pub fn prepare(raw_config: OrderDeskConfig, env: &HashMap<String, String>) -> Result<OrderDeskConfig> {
    let config = resolve(raw_config, env)?;

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    if !report.is_valid() {
        for error in &report.errors {
            tracing::error!(path = %error.path, message = %error.message, "Config error");
        }
        let summary: Vec<String> = report.errors.iter().map(|e| e.to_string()).collect();
        bail!("invalid configuration:\n  {}", summary.join("\n  "));
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn bare_environment_is_enough() {
        let cfg = prepare(
            OrderDeskConfig::default(),
            &env(&[("BOT_TOKEN", "123:abc"), ("ADMIN_CHAT_ID", "-1001")]),
        )
        .unwrap();
        assert_eq!(cfg.bot_token(), Some("123:abc"));
        assert_eq!(cfg.operator_chat_id(), Some(-1001));
        assert!(cfg.drop_pending_updates());
    }

    #[test]
    fn missing_credentials_are_fatal() {
        let err = prepare(OrderDeskConfig::default(), &HashMap::new()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("telegram.botToken"), "{msg}");
        assert!(msg.contains("operator.chatId"), "{msg}");
    }

    #[test]
    fn file_references_resolve_from_env() {
        let raw = parse_config(
            "telegram:\n  botToken: ${SHOP_TOKEN}\noperator:\n  chatId: 77\n",
        )
        .unwrap();
        let cfg = prepare(raw, &env(&[("SHOP_TOKEN", "999:zzz")])).unwrap();
        assert_eq!(cfg.bot_token(), Some("999:zzz"));
        assert_eq!(cfg.operator_chat_id(), Some(77));
    }

    #[test]
    fn env_override_beats_file() {
        let raw = parse_config("telegram:\n  botToken: from-file\noperator:\n  chatId: 1\n").unwrap();
        let cfg = prepare(raw, &env(&[("BOT_TOKEN", "from-env")])).unwrap();
        assert_eq!(cfg.bot_token(), Some("from-env"));
    }
}
