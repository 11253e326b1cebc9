//! Order Event Logger
//!
//! Structured order lifecycle events (session started, input rejected,
//! order finalized, notification failed, session reaped) emitted through
//! `tracing` under the `order_events` target, so the JSON file layer writes
//! them as NDJSON.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderLogEvent {
    SessionStarted {
        requester: String,
    },
    InputRejected {
        state: String,
        reason: String,
        input: String,
    },
    OrderFinalized {
        order_id: String,
        item: String,
    },
    NotificationFailed {
        order_id: String,
        error_msg: String,
    },
    SessionReaped {
        idle_secs: u64,
    },
}

#[derive(Debug, Serialize)]
pub struct OrderLogEntry {
    pub conversation_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: OrderLogEvent,
}

pub struct OrderEventLogger;

impl OrderEventLogger {
    /// Redact free text in `event`, then emit it as a structured log line.
    pub fn log_event(conversation_id: &str, mut event: OrderLogEvent) -> OrderLogEntry {
        match &mut event {
            OrderLogEvent::InputRejected { input, .. } => {
                *input = redact_sensitive_data(input);
            }
            OrderLogEvent::NotificationFailed { error_msg, .. } => {
                *error_msg = redact_sensitive_data(error_msg);
            }
            _ => {}
        }

        let entry = OrderLogEntry {
            conversation_id: conversation_id.into(),
            timestamp: Utc::now(),
            event,
        };

        let payload = serde_json::to_string(&entry).unwrap_or_default();
        match entry.event {
            OrderLogEvent::NotificationFailed { .. } => {
                warn!(target: "order_events", entry = %payload, "Order event");
            }
            _ => {
                info!(target: "order_events", entry = %payload, "Order event");
            }
        }
        entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_input_is_redacted() {
        let entry = OrderEventLogger::log_event(
            "tg-1",
            OrderLogEvent::InputRejected {
                state: "awaiting_phone".into(),
                reason: "invalid_phone".into(),
                input: "my number is 416-555-0199x".into(),
            },
        );
        match entry.event {
            OrderLogEvent::InputRejected { input, .. } => {
                assert!(input.contains("[REDACTED_PHONE]"));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn entry_serializes_with_type_tag() {
        let entry = OrderEventLogger::log_event(
            "tg-1",
            OrderLogEvent::OrderFinalized {
                order_id: "abc".into(),
                item: "Vodka".into(),
            },
        );
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["event"]["type"], "order_finalized");
        assert_eq!(json["conversation_id"], "tg-1");
    }
}
