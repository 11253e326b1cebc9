use std::sync::Arc;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::ChatId;
use tracing::{error, info, warn};

use orderdesk_core::{OrderEvent, OrderService};

use crate::telegram_commands::{bot_commands, TelegramCommand};
use crate::telegram_conversation::{conversation_for, decode_selection, requester_from_user};
use crate::telegram_send::{TelegramNotifier, TelegramSink};
use crate::ChannelAdapter;

pub struct TelegramAdapter {
    bot: Bot,
    drop_pending_updates: bool,
}

impl TelegramAdapter {
    pub fn new(token: String) -> Self {
        Self {
            bot: Bot::new(token),
            drop_pending_updates: true,
        }
    }

    /// Whether updates queued while offline are discarded on startup.
    pub fn with_drop_pending_updates(mut self, drop: bool) -> Self {
        self.drop_pending_updates = drop;
        self
    }

    /// Reply sink bound to this adapter's bot.
    pub fn sink(&self) -> TelegramSink {
        TelegramSink::new(self.bot.clone())
    }

    /// Operator notifier bound to this adapter's bot.
    pub fn notifier(&self, operator_chat_id: i64) -> TelegramNotifier {
        TelegramNotifier::new(self.bot.clone(), ChatId(operator_chat_id))
    }
}

/// Maps a message to an order event: `/start` and `/help` restart, anything
/// else is text. Non-text messages count as empty text so the current step
/// re-prompts.
pub fn event_for_text(text: Option<&str>) -> OrderEvent {
    match text {
        Some(text) => match TelegramCommand::parse(text) {
            Some(TelegramCommand::Start | TelegramCommand::Help) => OrderEvent::Start,
            None => OrderEvent::Text(text.to_string()),
        },
        None => OrderEvent::Text(String::new()),
    }
}

async fn on_message(msg: Message, service: Arc<OrderService>) -> ResponseResult<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let conversation = conversation_for(msg.chat.id, user.id);
    let requester = requester_from_user(user);
    let event = event_for_text(msg.text());

    if let Err(e) = service.dispatch(&conversation, &requester, event).await {
        error!(conversation = %conversation, error = %e, "Failed to process Telegram message");
    }
    Ok(())
}

async fn on_callback(bot: Bot, q: CallbackQuery, service: Arc<OrderService>) -> ResponseResult<()> {
    // Always acknowledge so the client stops its loading indicator.
    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        warn!(error = %e, "Failed to answer callback query");
    }

    let Some(clicked) = q.message.as_ref() else {
        return Ok(());
    };
    let Some(item_id) = q.data.as_deref().and_then(decode_selection) else {
        warn!(data = ?q.data, "Ignoring unrecognized callback payload");
        return Ok(());
    };

    let conversation = conversation_for(clicked.chat().id, q.from.id);
    let requester = requester_from_user(&q.from);
    let event = OrderEvent::ItemSelected(item_id.to_string());
    let origin = clicked.id().0.to_string();

    if let Err(e) = service
        .dispatch_from(&conversation, &requester, event, Some(&origin))
        .await
    {
        error!(conversation = %conversation, error = %e, "Failed to process item selection");
    }
    Ok(())
}

#[async_trait]
impl ChannelAdapter for TelegramAdapter {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn start(&self, service: Arc<OrderService>) -> anyhow::Result<()> {
        info!("Starting Telegram adapter");
        let bot = self.bot.clone();

        if self.drop_pending_updates {
            bot.delete_webhook().drop_pending_updates(true).await?;
            info!("Dropped pending Telegram updates");
        }
        if let Err(e) = bot.set_my_commands(bot_commands()).await {
            warn!(error = %e, "Failed to register bot commands");
        }

        let handler = dptree::entry()
            .branch(Update::filter_message().endpoint(on_message))
            .branch(Update::filter_callback_query().endpoint(on_callback));

        // The default distribution key is the chat id: one chat's updates are
        // handled in order, different chats run concurrently.
        Dispatcher::builder(bot, handler)
            .dependencies(dptree::deps![service])
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        info!("Telegram adapter stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orderdesk_core::{Catalog, OrderMachine, OrderState, Requester, SessionStore};
    use teloxide::types::UserId;

    #[test]
    fn commands_map_to_start() {
        assert_eq!(event_for_text(Some("/start")), OrderEvent::Start);
        assert_eq!(event_for_text(Some("/help")), OrderEvent::Start);
    }

    #[test]
    fn text_and_media_map_to_text() {
        assert_eq!(
            event_for_text(Some("742 Evergreen Terrace")),
            OrderEvent::Text("742 Evergreen Terrace".into())
        );
        assert_eq!(event_for_text(Some("/menu")), OrderEvent::Text("/menu".into()));
        assert_eq!(event_for_text(None), OrderEvent::Text(String::new()));
    }

    #[test]
    fn group_members_order_independently() {
        let machine = OrderMachine::new(Arc::new(Catalog::default()), Arc::new(SessionStore::new()));
        let group = ChatId(-100);
        let (alice, bob) = (conversation_for(group, UserId(1)), conversation_for(group, UserId(2)));
        let alice_user = Requester::new("1", Some("alice".into()), "Alice");
        let bob_user = Requester::new("2", Some("bob".into()), "Bob");

        machine.handle(&alice, &alice_user, OrderEvent::Start);
        machine.handle(&alice, &alice_user, event_for_text(Some("742 Evergreen Terrace")));

        // Bob clicking Alice's keyboard only opens his own order.
        let click = machine.handle(&bob, &bob_user, OrderEvent::ItemSelected("soda".into()));
        assert!(click.started);
        let phone = machine.handle(&bob, &bob_user, event_for_text(Some("416-555-0199")));
        assert!(!phone.is_finalized());

        let hers = machine.store().get(&alice).unwrap();
        assert_eq!(hers.state, OrderState::AwaitingItem);
        assert!(hers.item.is_none() && hers.phone.is_none());
        // His text went into his own fresh session as an address.
        let his = machine.store().get(&bob).unwrap();
        assert_eq!(his.state, OrderState::AwaitingItem);
        assert_eq!(his.requester.id, "2");
    }
}
