//! OrderDesk runtime configuration schema.
//!
//! Typed for serde YAML/JSON deserialization. Every section is optional in
//! the file; defaults and env overrides fill the gaps before validation.

use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration for OrderDesk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDeskConfig {
    /// Telegram transport credentials and startup behaviour
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram: Option<TelegramConfig>,

    /// Where completed orders are forwarded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<OperatorConfig>,

    /// Orderable items, in display order. Empty means the built-in menu.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub catalog: Vec<CatalogItemConfig>,

    /// In-memory session policy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sessions: Option<SessionsConfig>,

    /// Logging configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

impl OrderDeskConfig {
    pub fn bot_token(&self) -> Option<&str> {
        self.telegram
            .as_ref()
            .and_then(|t| t.bot_token.as_deref())
            .filter(|t| !t.trim().is_empty())
    }

    /// Operator chat id, if set and numeric.
    pub fn operator_chat_id(&self) -> Option<i64> {
        self.operator
            .as_ref()
            .and_then(|o| o.chat_id.as_deref())
            .and_then(|id| id.trim().parse().ok())
    }

    pub fn drop_pending_updates(&self) -> bool {
        self.telegram
            .as_ref()
            .and_then(|t| t.drop_pending_updates)
            .unwrap_or(true)
    }

    /// Idle session expiry in seconds; `None` (or 0) keeps sessions until they finish.
    pub fn idle_ttl_secs(&self) -> Option<u64> {
        self.sessions
            .as_ref()
            .and_then(|s| s.idle_ttl_secs)
            .filter(|&secs| secs > 0)
    }
}

// ---------------------------------------------------------------------------
// Telegram
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    /// Discard updates queued while the bot was offline (default true).
    pub drop_pending_updates: Option<bool>,
}

// ---------------------------------------------------------------------------
// Operator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorConfig {
    /// Telegram chat id of the operator. Accepts a YAML string or integer.
    #[serde(default, deserialize_with = "string_or_int")]
    pub chat_id: Option<String>,
}

fn string_or_int<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Str(String),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Int(n) => n.to_string(),
        Raw::Str(s) => s,
    }))
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItemConfig {
    pub id: String,
    pub name: String,
    pub price: f64,
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionsConfig {
    /// Drop sessions idle for this many seconds. Unset keeps them forever.
    pub idle_ttl_secs: Option<u64>,
    /// How often the reaper sweeps, in seconds.
    pub reap_interval_secs: Option<u64>,
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    /// Default filter directive (`RUST_LOG` wins).
    pub level: Option<String>,
    /// Directory for the rolling NDJSON log; console only when unset.
    pub dir: Option<String>,
    /// Emit console output as JSON.
    pub json: Option<bool>,
}
