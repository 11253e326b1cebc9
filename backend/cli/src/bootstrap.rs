//! Turns a prepared config into the runtime pieces the order service needs.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use orderdesk_config::{
    CatalogItemConfig, OperatorConfig, OrderDeskConfig, SessionsConfig, TelegramConfig,
};
use orderdesk_core::{Catalog, CatalogEntry, Price, SessionStore};
use orderdesk_logging::LoggerConfig;

/// Build the catalog from config, falling back to the built-in menu.
pub fn build_catalog(config: &OrderDeskConfig) -> Result<Catalog> {
    if config.catalog.is_empty() {
        return Ok(Catalog::default());
    }
    let entries = config
        .catalog
        .iter()
        .map(|item| {
            let price = Price::try_from(item.price)
                .with_context(|| format!("catalog item '{}'", item.id))?;
            Ok(CatalogEntry::new(item.id.trim(), item.name.clone(), price))
        })
        .collect::<Result<Vec<_>>>()?;
    Catalog::new(entries).context("invalid catalog")
}

pub fn build_store(config: &OrderDeskConfig) -> SessionStore {
    match config.idle_ttl_secs() {
        Some(secs) => SessionStore::with_idle_ttl(Duration::from_secs(secs)),
        None => SessionStore::new(),
    }
}

/// Reaper sweep interval, when idle expiry is enabled.
pub fn reap_interval(config: &OrderDeskConfig) -> Option<Duration> {
    config.idle_ttl_secs()?;
    let secs = config
        .sessions
        .as_ref()
        .and_then(|s| s.reap_interval_secs)
        .unwrap_or(orderdesk_config::defaults::DEFAULT_REAP_INTERVAL_SECS);
    Some(Duration::from_secs(secs.max(1)))
}

pub fn logger_config(config: &OrderDeskConfig) -> LoggerConfig {
    let logging = config.logging.clone().unwrap_or_default();
    LoggerConfig {
        level: logging
            .level
            .unwrap_or_else(|| orderdesk_config::defaults::DEFAULT_LOG_LEVEL.to_string()),
        dir: logging.dir.map(Into::into),
        json_console: logging.json.unwrap_or(false),
    }
}

/// Starter config written by `orderdesk init`: credentials come from the
/// environment, the catalog is the built-in menu spelled out for editing.
pub fn starter_config() -> OrderDeskConfig {
    OrderDeskConfig {
        telegram: Some(TelegramConfig {
            bot_token: Some("${BOT_TOKEN}".to_string()),
            drop_pending_updates: Some(true),
        }),
        operator: Some(OperatorConfig {
            chat_id: Some("${ADMIN_CHAT_ID}".to_string()),
        }),
        catalog: Catalog::default()
            .list()
            .iter()
            .map(|e| CatalogItemConfig {
                id: e.id.clone(),
                name: e.name.clone(),
                price: e.price.into(),
            })
            .collect(),
        sessions: Some(SessionsConfig {
            idle_ttl_secs: None,
            reap_interval_secs: Some(orderdesk_config::defaults::DEFAULT_REAP_INTERVAL_SECS),
        }),
        logging: None,
    }
}

/// Config as JSON with secrets masked, plus the paths that were masked.
pub fn masked_view(config: &OrderDeskConfig) -> Result<(serde_json::Value, Vec<String>)> {
    let value = serde_json::to_value(config).context("Failed to serialize config")?;
    let masked = orderdesk_config::collect_redacted_paths(&value);
    Ok((orderdesk_config::redact(&value), masked))
}

/// Shared handles built once at startup.
pub struct Runtime {
    pub catalog: Arc<Catalog>,
    pub store: Arc<SessionStore>,
}

impl Runtime {
    pub fn from_config(config: &OrderDeskConfig) -> Result<Self> {
        Ok(Self {
            catalog: Arc::new(build_catalog(config)?),
            store: Arc::new(build_store(config)),
        })
    }
}
