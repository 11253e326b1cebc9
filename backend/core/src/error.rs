use thiserror::Error;

/// Top-level error type for the OrderDesk runtime.
///
/// User-input problems never show up here: the state machine turns them into
/// re-prompts. Only configuration and delivery failures cross the core boundary.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("order notification failed: {0}")]
    Notification(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T, E = OrderError> = std::result::Result<T, E>;
