use std::sync::Arc;

use async_trait::async_trait;
use orderdesk_core::OrderService;

pub mod telegram;
pub mod telegram_commands;
pub mod telegram_conversation;
pub mod telegram_send;

pub use telegram::TelegramAdapter;
pub use telegram_send::{TelegramNotifier, TelegramSink};

/// All channel adapters implement this trait.
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    /// Human-readable adapter name for logging.
    fn name(&self) -> &str;

    /// Receive updates and feed them to `service` until shutdown.
    async fn start(&self, service: Arc<OrderService>) -> anyhow::Result<()>;
}
