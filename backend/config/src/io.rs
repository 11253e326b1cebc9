//! Config file read/write.

use crate::schema::OrderDeskConfig;
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Default config file name within the config directory.
const CONFIG_FILE_NAME: &str = "config.yaml";

/// Resolve the OrderDesk config directory.
/// Priority: `ORDERDESK_CONFIG_DIR` env > `~/.orderdesk/` > `./.orderdesk`
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("ORDERDESK_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    match dirs::home_dir() {
        Some(home) => home.join(".orderdesk"),
        None => PathBuf::from(".orderdesk"),
    }
}

/// Resolve the full path to the main config file.
pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// Parse config YAML text.
pub fn parse_config(raw: &str) -> Result<OrderDeskConfig> {
    if raw.trim().is_empty() {
        return Ok(OrderDeskConfig::default());
    }
    serde_yaml::from_str(raw).context("Failed to parse config YAML")
}

/// Load and parse the config from disk.
///
/// Returns `Ok(Default::default())` if the file doesn't exist, so a bare
/// `BOT_TOKEN` / `ADMIN_CHAT_ID` environment is enough to start.
pub async fn load_config(path: &Path) -> Result<OrderDeskConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(OrderDeskConfig::default());
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config = parse_config(&raw).with_context(|| format!("In config file: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(config)
}

/// Write config to disk atomically (write to temp file, rename).
///
/// Refuses to replace an existing file unless `overwrite` is set.
pub async fn write_config(config: &OrderDeskConfig, path: &Path, overwrite: bool) -> Result<()> {
    if path.exists() && !overwrite {
        bail!("Config file already exists: {}", path.display());
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.with_context(|| {
            format!("Failed to create config directory: {}", parent.display())
        })?;
    }

    let yaml = serde_yaml::to_string(config).context("Failed to serialize config to YAML")?;

    let tmp_path = path.with_extension("yaml.tmp");
    fs::write(&tmp_path, yaml.as_bytes())
        .await
        .with_context(|| format!("Failed to write temp config: {}", tmp_path.display()))?;

    fs::rename(&tmp_path, path)
        .await
        .with_context(|| format!("Failed to rename temp config to: {}", path.display()))?;

    info!(path = %path.display(), "Wrote config");
    Ok(())
}
