//! Telemetry and structured logging for OrderDesk.
//!
//! Console + rolling NDJSON output, log redaction, and the order lifecycle event log.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{OrderEventLogger, OrderLogEntry, OrderLogEvent};
pub use logger::{init_logger, LoggerConfig};
pub use redact::redact_sensitive_data;
