//! Structured Logger
//!
//! Wraps `tracing` to provide console output, an optional daily-rolling
//! NDJSON file, and environment-based level control.

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// File name prefix for the rolling log: `orderdesk.log.YYYY-MM-DD`.
const LOG_FILE_PREFIX: &str = "orderdesk.log";

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Default filter directive when `RUST_LOG` is not set.
    pub level: String,
    /// Directory for the NDJSON file; console only when `None`.
    pub dir: Option<PathBuf>,
    /// Emit console lines as JSON instead of the human format.
    pub json_console: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
            json_console: false,
        }
    }
}

/// Initialize the global structured logger.
///
/// `RUST_LOG` overrides `config.level`. Fails if a global subscriber is
/// already installed.
pub fn init_logger(config: &LoggerConfig) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let file_layer = config.dir.as_ref().map(|dir| {
        let appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_PREFIX);
        fmt::layer().json().with_writer(appender).with_ansi(false)
    });

    let (plain_console, json_console) = if config.json_console {
        (None, Some(fmt::layer().json().with_writer(std::io::stdout)))
    } else {
        (
            Some(fmt::layer().with_writer(std::io::stdout).with_target(false).with_ansi(true)),
            None,
        )
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(plain_console)
        .with(json_console)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
}
