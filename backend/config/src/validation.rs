//! Config validation: schema checks with user-friendly error messages.

use std::collections::HashSet;

use crate::schema::OrderDeskConfig;
use thiserror::Error;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &OrderDeskConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_telegram(config, &mut report);
    validate_operator(config, &mut report);
    validate_catalog(config, &mut report);
    validate_sessions(config, &mut report);
    report
}

fn validate_telegram(config: &OrderDeskConfig, report: &mut ValidationReport) {
    if config.bot_token().is_none() {
        report.error(
            "telegram.botToken",
            "Telegram bot token is required (set BOT_TOKEN)",
        );
    }
}

fn validate_operator(config: &OrderDeskConfig, report: &mut ValidationReport) {
    let raw = config
        .operator
        .as_ref()
        .and_then(|o| o.chat_id.as_deref())
        .map(str::trim)
        .filter(|s| !s.is_empty());
    match raw {
        None => report.error(
            "operator.chatId",
            "Operator chat id is required (set ADMIN_CHAT_ID)",
        ),
        Some(id) if id.parse::<i64>().is_err() => report.error(
            "operator.chatId",
            format!("Operator chat id '{id}' is not an integer"),
        ),
        Some(_) => {}
    }
}

fn validate_catalog(config: &OrderDeskConfig, report: &mut ValidationReport) {
    if config.catalog.is_empty() {
        report.warn("catalog", "No catalog configured; using the built-in menu");
        return;
    }
    let mut seen = HashSet::new();
    for (i, item) in config.catalog.iter().enumerate() {
        let path = format!("catalog[{i}]");
        if item.id.trim().is_empty() {
            report.error(format!("{path}.id"), "Item id cannot be empty");
        } else if !seen.insert(item.id.as_str()) {
            report.error(format!("{path}.id"), format!("Duplicate item id '{}'", item.id));
        }
        if item.name.trim().is_empty() {
            report.error(format!("{path}.name"), "Item name cannot be empty");
        }
        if !item.price.is_finite() || item.price < 0.0 {
            report.error(format!("{path}.price"), "Price must be a non-negative number");
        }
    }
}

fn validate_sessions(config: &OrderDeskConfig, report: &mut ValidationReport) {
    let Some(sessions) = &config.sessions else { return };
    if sessions.reap_interval_secs == Some(0) {
        report.error("sessions.reapIntervalSecs", "reapIntervalSecs must be >= 1");
    }
    if config.idle_ttl_secs().is_none() {
        report.warn(
            "sessions.idleTtlSecs",
            "Idle sessions are never expired; abandoned conversations stay in memory",
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CatalogItemConfig, OperatorConfig, TelegramConfig};

    fn runnable() -> OrderDeskConfig {
        OrderDeskConfig {
            telegram: Some(TelegramConfig {
                bot_token: Some("123:abc".into()),
                ..Default::default()
            }),
            operator: Some(OperatorConfig {
                chat_id: Some("4242".into()),
            }),
            ..Default::default()
        }
    }

    fn item(id: &str, price: f64) -> CatalogItemConfig {
        CatalogItemConfig {
            id: id.into(),
            name: format!("Item {id}"),
            price,
        }
    }

    #[test]
    fn empty_config_is_invalid() {
        let report = validate(&OrderDeskConfig::default());
        assert!(!report.is_valid());
        let paths: Vec<&str> = report.errors.iter().map(|e| e.path.as_str()).collect();
        assert!(paths.contains(&"telegram.botToken"));
        assert!(paths.contains(&"operator.chatId"));
    }

    #[test]
    fn token_and_operator_are_enough() {
        let report = validate(&runnable());
        assert!(report.is_valid(), "errors: {:?}", report.errors);
        assert!(report.warnings.iter().any(|w| w.path == "catalog"));
    }

    #[test]
    fn non_numeric_chat_id_is_error() {
        let mut cfg = runnable();
        cfg.operator = Some(OperatorConfig {
            chat_id: Some("@ops".into()),
        });
        let report = validate(&cfg);
        assert!(report.errors[0].message.contains("not an integer"));
    }

    #[test]
    fn catalog_problems_are_reported() {
        let mut cfg = runnable();
        cfg.catalog = vec![item("tea", 4.5), item("tea", 5.0), item("", 1.0), item("cake", -2.0)];
        let report = validate(&cfg);
        let paths: Vec<&str> = report.errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, ["catalog[1].id", "catalog[2].id", "catalog[3].price"]);
    }
}
