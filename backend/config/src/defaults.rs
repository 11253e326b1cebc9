//! Config defaults: applies default values to parsed config.

use crate::schema::{LoggingConfig, OrderDeskConfig, SessionsConfig, TelegramConfig};

/// Default reaper sweep interval (seconds).
pub const DEFAULT_REAP_INTERVAL_SECS: u64 = 60;

/// Default log filter directive.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: OrderDeskConfig) -> OrderDeskConfig {
    let config = apply_telegram_defaults(config);
    let config = apply_session_defaults(config);
    apply_logging_defaults(config)
}

/// Drop stale updates on startup unless told otherwise.
fn apply_telegram_defaults(mut config: OrderDeskConfig) -> OrderDeskConfig {
    let telegram = config.telegram.get_or_insert_with(TelegramConfig::default);
    if telegram.drop_pending_updates.is_none() {
        telegram.drop_pending_updates = Some(true);
    }
    config
}

/// Sessions never expire by default; only the sweep interval gets a value.
fn apply_session_defaults(mut config: OrderDeskConfig) -> OrderDeskConfig {
    let sessions = config.sessions.get_or_insert_with(SessionsConfig::default);
    if sessions.reap_interval_secs.is_none() {
        sessions.reap_interval_secs = Some(DEFAULT_REAP_INTERVAL_SECS);
    }
    config
}

fn apply_logging_defaults(mut config: OrderDeskConfig) -> OrderDeskConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    if logging.level.is_none() {
        logging.level = Some(DEFAULT_LOG_LEVEL.to_string());
    }
    if logging.json.is_none() {
        logging.json = Some(false);
    }
    config
}
