//! Telegram outbound delivery: replies to customers and the operator notifier.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, MessageId};
use tracing::{debug, warn};

use orderdesk_core::error::Result;
use orderdesk_core::{
    CompletedOrder, ConversationId, MessageSink, NotificationSink, OrderError, OutboundMessage,
    SelectOption,
};

use crate::telegram_conversation::{chat_for_conversation, encode_selection};

fn transport_error(e: teloxide::RequestError) -> OrderError {
    OrderError::Transport(e.to_string())
}

/// One button per row, labelled `"{name} - ${price}"`.
pub fn build_keyboard(options: &[SelectOption]) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = options
        .iter()
        .filter_map(|opt| match encode_selection(&opt.id) {
            Some(data) => Some(vec![InlineKeyboardButton::callback(opt.label.clone(), data)]),
            None => {
                warn!(item_id = %opt.id, "Item id too long for a Telegram button; skipping");
                None
            }
        })
        .collect();
    InlineKeyboardMarkup::new(rows)
}

/// Message id of the clicked keyboard, as carried through the order service.
pub fn clicked_message(origin: Option<&str>) -> Option<MessageId> {
    origin?.parse().ok().map(MessageId)
}

/// Sends order-flow messages back into the customer's chat.
pub struct TelegramSink {
    bot: Bot,
}

impl TelegramSink {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    async fn deliver(
        &self,
        chat_id: ChatId,
        clicked: Option<MessageId>,
        message: &OutboundMessage,
    ) -> Result<()> {
        match message {
            OutboundMessage::Text(text) => {
                self.bot.send_message(chat_id, text).await.map_err(transport_error)?;
            }
            OutboundMessage::Choice { text, options } => {
                self.bot
                    .send_message(chat_id, text)
                    .reply_markup(build_keyboard(options))
                    .await
                    .map_err(transport_error)?;
            }
            OutboundMessage::SelectionMade(text) => {
                // Editing the clicked keyboard message drops its buttons.
                let edited = match clicked {
                    Some(message_id) => self
                        .bot
                        .edit_message_text(chat_id, message_id, text)
                        .await
                        .map(|_| true)
                        .unwrap_or_else(|e| {
                            debug!(chat_id = chat_id.0, error = %e, "Could not edit item keyboard");
                            false
                        }),
                    None => false,
                };
                if !edited {
                    self.bot.send_message(chat_id, text).await.map_err(transport_error)?;
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl MessageSink for TelegramSink {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send(
        &self,
        conversation: &ConversationId,
        origin: Option<&str>,
        messages: &[OutboundMessage],
    ) -> Result<()> {
        let chat_id = chat_for_conversation(conversation).ok_or_else(|| {
            OrderError::Transport(format!("'{conversation}' is not a Telegram conversation"))
        })?;
        let clicked = clicked_message(origin);
        for message in messages {
            self.deliver(chat_id, clicked, message).await?;
        }
        Ok(())
    }
}

/// Forwards completed orders to the operator chat.
pub struct TelegramNotifier {
    bot: Bot,
    operator: ChatId,
}

impl TelegramNotifier {
    pub fn new(bot: Bot, operator: ChatId) -> Self {
        Self { bot, operator }
    }
}

#[async_trait]
impl NotificationSink for TelegramNotifier {
    fn name(&self) -> &str {
        "telegram-operator"
    }

    async fn notify(&self, order: &CompletedOrder) -> Result<()> {
        self.bot
            .send_message(self.operator, order.summary())
            .await
            .map_err(|e| OrderError::Notification(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orderdesk_core::Catalog;
    use teloxide::types::InlineKeyboardButtonKind;

    fn options() -> Vec<SelectOption> {
        Catalog::default()
            .list()
            .iter()
            .map(|e| SelectOption {
                id: e.id.clone(),
                label: e.option_label(),
            })
            .collect()
    }

    #[test]
    fn keyboard_has_one_row_per_item() {
        let markup = build_keyboard(&options());
        assert_eq!(markup.inline_keyboard.len(), 4);
        assert!(markup.inline_keyboard.iter().all(|row| row.len() == 1));

        let soda = &markup.inline_keyboard[3][0];
        assert_eq!(soda.text, "Soda Pop 🥤 - $3000.00");
        match &soda.kind {
            InlineKeyboardButtonKind::CallbackData(data) => assert_eq!(data, "select_item:soda"),
            other => panic!("unexpected button kind {other:?}"),
        }
        match &markup.inline_keyboard[0][0].kind {
            InlineKeyboardButtonKind::CallbackData(data) => {
                assert_eq!(data, "select_item:vodka - absolute")
            }
            other => panic!("unexpected button kind {other:?}"),
        }
    }

    #[test]
    fn keyboard_skips_unencodable_ids() {
        let opts = vec![
            SelectOption { id: "tea".into(), label: "Tea - $1.00".into() },
            SelectOption { id: "y".repeat(80), label: "Too long".into() },
        ];
        assert_eq!(build_keyboard(&opts).inline_keyboard.len(), 1);
    }

    #[tokio::test]
    async fn sink_rejects_foreign_conversations() {
        let sink = TelegramSink::new(Bot::new("123:test"));
        let err = sink
            .send(&ConversationId::new("slack-C1"), None, &[OutboundMessage::Text("hi".into())])
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Transport(_)));
    }

    #[test]
    fn selection_targets_the_clicked_keyboard() {
        assert_eq!(clicked_message(Some("1042")), Some(MessageId(1042)));
        assert_eq!(clicked_message(Some("not-a-message")), None);
        assert_eq!(clicked_message(None), None);
    }
}
