//! Order service: runs the state machine for one inbound event and performs
//! the resulting I/O (replies, operator notification).
//!
//! The machine finalizes and clears the session before any delivery is
//! attempted, so a failed notification can never leave a half-finished
//! session behind. The requester is told either way.

use std::sync::Arc;

use tracing::{error, info, warn};

use orderdesk_logging::{OrderEventLogger, OrderLogEvent};

use crate::error::{OrderError, Result};
use crate::machine::{OrderEvent, OrderMachine, OutboundMessage};
use crate::session::{ConversationId, OrderState, Requester};
use crate::traits::{MessageSink, NotificationSink};

pub const ORDER_CONFIRMED: &str =
    "Thank you! Your order has been placed. We will contact you shortly to confirm.";
pub const ORDER_FAILED: &str =
    "Sorry, there was an issue placing your order. Please try again later.";

/// What happened while dispatching one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    /// Session state afterwards; `None` once finalized.
    pub state: Option<OrderState>,
    pub finalized: bool,
    /// `Some(true)` when the operator was notified, `Some(false)` when that failed.
    pub delivered: Option<bool>,
}

pub struct OrderService {
    machine: OrderMachine,
    replies: Arc<dyn MessageSink>,
    notifier: Arc<dyn NotificationSink>,
}

impl OrderService {
    pub fn new(
        machine: OrderMachine,
        replies: Arc<dyn MessageSink>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            machine,
            replies,
            notifier,
        }
    }

    pub fn machine(&self) -> &OrderMachine {
        &self.machine
    }

    /// Handle one inbound event end to end.
    ///
    /// Returns an error only for transport or notification failures; by then
    /// the session has already been updated (or removed) and the requester
    /// has been sent whatever could be sent.
    pub async fn dispatch(
        &self,
        conversation: &ConversationId,
        requester: &Requester,
        event: OrderEvent,
    ) -> Result<DispatchReport> {
        self.dispatch_from(conversation, requester, event, None).await
    }

    /// [`dispatch`](Self::dispatch) for an event raised on a specific message,
    /// such as a button click. `origin` is handed to the reply sink so the
    /// acknowledgement can replace that message.
    pub async fn dispatch_from(
        &self,
        conversation: &ConversationId,
        requester: &Requester,
        event: OrderEvent,
        origin: Option<&str>,
    ) -> Result<DispatchReport> {
        let input = match &event {
            OrderEvent::Text(text) => text.clone(),
            OrderEvent::ItemSelected(id) => id.clone(),
            OrderEvent::Start => String::new(),
        };

        let outcome = self.machine.handle(conversation, requester, event);

        if outcome.started {
            OrderEventLogger::log_event(
                conversation.as_str(),
                OrderLogEvent::SessionStarted {
                    requester: requester.display_name(),
                },
            );
        }
        if let (Some(rejection), Some(state)) = (outcome.rejection, outcome.state) {
            OrderEventLogger::log_event(
                conversation.as_str(),
                OrderLogEvent::InputRejected {
                    state: state.to_string(),
                    reason: format!("{rejection:?}"),
                    input,
                },
            );
        }

        let mut first_error: Option<OrderError> = None;
        if !outcome.messages.is_empty() {
            if let Err(e) = self.replies.send(conversation, origin, &outcome.messages).await {
                warn!(conversation = %conversation, sink = self.replies.name(), error = %e, "Failed to send reply");
                first_error = Some(e);
            }
        }

        let mut report = DispatchReport {
            state: outcome.state,
            finalized: outcome.is_finalized(),
            delivered: None,
        };

        if let Some(order) = outcome.completed {
            OrderEventLogger::log_event(
                conversation.as_str(),
                OrderLogEvent::OrderFinalized {
                    order_id: order.order_id.to_string(),
                    item: order.item_name.clone(),
                },
            );

            let reply = match self.notifier.notify(&order).await {
                Ok(()) => {
                    info!(order_id = %order.order_id, notifier = self.notifier.name(), "Order forwarded to operator");
                    report.delivered = Some(true);
                    ORDER_CONFIRMED
                }
                Err(e) => {
                    error!(order_id = %order.order_id, error = %e, "Error sending order to operator");
                    OrderEventLogger::log_event(
                        conversation.as_str(),
                        OrderLogEvent::NotificationFailed {
                            order_id: order.order_id.to_string(),
                            error_msg: e.to_string(),
                        },
                    );
                    report.delivered = Some(false);
                    first_error.get_or_insert(OrderError::Notification(e.to_string()));
                    ORDER_FAILED
                }
            };

            let confirmation = [OutboundMessage::Text(reply.to_string())];
            if let Err(e) = self.replies.send(conversation, None, &confirmation).await {
                warn!(conversation = %conversation, error = %e, "Failed to send order confirmation");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(report),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::session::CompletedOrder;
    use crate::store::SessionStore;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<(ConversationId, OutboundMessage)>>,
        origins: Mutex<Vec<Option<String>>>,
    }

    #[async_trait]
    impl MessageSink for RecordingSink {
        fn name(&self) -> &str {
            "recording"
        }

        async fn send(
            &self,
            conversation: &ConversationId,
            origin: Option<&str>,
            messages: &[OutboundMessage],
        ) -> Result<()> {
            self.origins.lock().unwrap().push(origin.map(str::to_string));
            let mut sent = self.sent.lock().unwrap();
            for m in messages {
                sent.push((conversation.clone(), m.clone()));
            }
            Ok(())
        }
    }

    struct Notifier {
        fail: bool,
        orders: Mutex<Vec<CompletedOrder>>,
    }

    #[async_trait]
    impl NotificationSink for Notifier {
        fn name(&self) -> &str {
            "test-operator"
        }

        async fn notify(&self, order: &CompletedOrder) -> Result<()> {
            if self.fail {
                return Err(OrderError::Transport("operator chat unreachable".into()));
            }
            self.orders.lock().unwrap().push(order.clone());
            Ok(())
        }
    }

    fn service(fail: bool) -> (OrderService, Arc<RecordingSink>, Arc<Notifier>) {
        let sink = Arc::new(RecordingSink::default());
        let notifier = Arc::new(Notifier {
            fail,
            orders: Mutex::new(Vec::new()),
        });
        let machine = OrderMachine::new(Arc::new(Catalog::default()), Arc::new(SessionStore::new()));
        (OrderService::new(machine, sink.clone(), notifier.clone()), sink, notifier)
    }

    async fn walk_to_phone(svc: &OrderService, c: &ConversationId, who: &Requester) {
        svc.dispatch(c, who, OrderEvent::Start).await.unwrap();
        svc.dispatch(c, who, OrderEvent::Text("742 Evergreen Terrace".into()))
            .await
            .unwrap();
        svc.dispatch(c, who, OrderEvent::ItemSelected("vodka - absolute".into()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn successful_order_notifies_and_confirms() {
        let (svc, sink, notifier) = service(false);
        let c = ConversationId::new("tg-1");
        let who = Requester::new("1", Some("bart".into()), "Bart Simpson");
        walk_to_phone(&svc, &c, &who).await;

        let report = svc
            .dispatch(&c, &who, OrderEvent::Text("(416) 555-0199".into()))
            .await
            .unwrap();
        assert!(report.finalized);
        assert_eq!(report.delivered, Some(true));
        assert_eq!(report.state, None);

        let orders = notifier.orders.lock().unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].requester_display_name, "@bart");
        assert_eq!(orders[0].item_name, "Vodka");

        let sent = sink.sent.lock().unwrap();
        assert_eq!(
            sent.last().unwrap().1,
            OutboundMessage::Text(ORDER_CONFIRMED.into())
        );
        assert!(!svc.machine().store().contains(&c));
    }

    #[tokio::test]
    async fn failed_notification_still_clears_session_and_apologizes() {
        let (svc, sink, _) = service(true);
        let c = ConversationId::new("tg-2");
        let who = Requester::new("2", None, "Lisa Simpson");
        walk_to_phone(&svc, &c, &who).await;

        let result = svc
            .dispatch(&c, &who, OrderEvent::Text("4165550199".into()))
            .await;
        assert!(matches!(result, Err(OrderError::Notification(_))));
        assert!(!svc.machine().store().contains(&c));

        let sent = sink.sent.lock().unwrap();
        assert_eq!(sent.last().unwrap().1, OutboundMessage::Text(ORDER_FAILED.into()));
    }

    #[tokio::test]
    async fn rejected_input_only_replies() {
        let (svc, sink, notifier) = service(false);
        let c = ConversationId::new("tg-3");
        let who = Requester::default();
        svc.dispatch(&c, &who, OrderEvent::Start).await.unwrap();
        let report = svc
            .dispatch(&c, &who, OrderEvent::Text("abc".into()))
            .await
            .unwrap();
        assert_eq!(report.state, Some(OrderState::AwaitingAddress));
        assert!(!report.finalized);
        assert_eq!(report.delivered, None);
        assert_eq!(sink.sent.lock().unwrap().len(), 2);
        assert!(notifier.orders.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn clicked_message_reaches_the_sink() {
        let (svc, sink, _) = service(false);
        let c = ConversationId::new("tg-4:4");
        let who = Requester::default();
        svc.dispatch(&c, &who, OrderEvent::Start).await.unwrap();
        svc.dispatch(&c, &who, OrderEvent::Text("742 Evergreen Terrace".into()))
            .await
            .unwrap();
        svc.dispatch_from(&c, &who, OrderEvent::ItemSelected("soda".into()), Some("77"))
            .await
            .unwrap();

        let origins = sink.origins.lock().unwrap();
        assert_eq!(
            origins.as_slice(),
            [None, None, Some("77".to_string())].as_slice()
        );
        assert_eq!(
            sink.sent.lock().unwrap()[2].1,
            OutboundMessage::SelectionMade("You've selected: Soda Pop 🥤.".into())
        );
    }
}
