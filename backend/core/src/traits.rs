use async_trait::async_trait;

use crate::error::Result;
use crate::machine::OutboundMessage;
use crate::session::{CompletedOrder, ConversationId};

/// Delivers outcome messages back to the conversation they came from.
///
/// Implemented by each transport adapter (Telegram, test doubles).
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Transport name for logging.
    fn name(&self) -> &str;

    /// Send `messages` to `conversation`, in order.
    ///
    /// `origin` is the transport's id for the message the user interacted
    /// with (the clicked keyboard), when there was one.
    async fn send(
        &self,
        conversation: &ConversationId,
        origin: Option<&str>,
        messages: &[OutboundMessage],
    ) -> Result<()>;
}

/// Forwards completed orders to the fixed operator destination.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    fn name(&self) -> &str;

    async fn notify(&self, order: &CompletedOrder) -> Result<()>;
}
