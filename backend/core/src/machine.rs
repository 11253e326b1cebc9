//! Order session state machine.
//!
//! `AwaitingAddress → AwaitingItem → AwaitingPhone → (removed)`. Each call to
//! [`OrderMachine::handle`] is one synchronous transition under the store lock;
//! invalid input re-prompts and never advances the state.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::Catalog;
use crate::session::{
    CompletedOrder, ConversationId, OrderState, Requester, SelectedItem, Session,
};
use crate::store::SessionStore;

/// Minimum address length in characters, after trimming.
pub const MIN_ADDRESS_LEN: usize = 5;

/// North-American 10-digit number, optional `+1`/`1` prefix and separators.
static PHONE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\+1|1)?[\s.-]?\(?(\d{3})\)?[\s.-]?(\d{3})[\s.-]?(\d{4})$").unwrap()
});

pub const WELCOME_PROMPT: &str =
    "Hello! Welcome to our ordering service. What's your delivery address?";
pub const ADDRESS_RETRY: &str =
    "That doesn't look like a complete address. Please provide a more detailed address.";
pub const ITEM_PROMPT: &str = "Great! Now, what would you like to order?";
pub const ITEM_REMINDER: &str = "Please choose an item from the menu below.";
pub const ITEM_UNAVAILABLE: &str =
    "Sorry, that item is not available. Please choose from the menu.";
pub const PHONE_PROMPT: &str = "What is your Canadian phone number (e.g., 123-456-7890)?";
pub const PHONE_RETRY: &str =
    "That doesn't look like a valid Canadian phone number. Please try again.";

/// Inbound event, already decoded from the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum OrderEvent {
    /// `/start` (or `/help`): begin a fresh order.
    Start,
    /// Free-form text message.
    Text(String),
    /// Button click carrying a catalog item id.
    ItemSelected(String),
}

/// One selectable button in a choice prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub id: String,
    pub label: String,
}

/// Message for the outbound sink to deliver on the originating transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum OutboundMessage {
    Text(String),
    /// Prompt with one selectable option per catalog entry.
    Choice { text: String, options: Vec<SelectOption> },
    /// Acknowledges a selection; replaces the choice prompt where the transport can.
    SelectionMade(String),
}

/// Why an event did not advance the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    AddressTooShort,
    UnknownItem,
    InvalidPhone,
    UnexpectedEvent,
}

/// Result of one `handle()` call.
#[derive(Debug, Clone, Default)]
pub struct Outcome {
    pub messages: Vec<OutboundMessage>,
    /// State after the call; `None` once the session has been removed.
    pub state: Option<OrderState>,
    /// True when the call created or reset the session.
    pub started: bool,
    pub rejection: Option<Rejection>,
    pub completed: Option<CompletedOrder>,
}

impl Outcome {
    fn advanced(state: OrderState, messages: Vec<OutboundMessage>) -> Self {
        Self {
            messages,
            state: Some(state),
            ..Default::default()
        }
    }

    fn rejected(state: OrderState, rejection: Rejection, messages: Vec<OutboundMessage>) -> Self {
        Self {
            messages,
            state: Some(state),
            rejection: Some(rejection),
            ..Default::default()
        }
    }

    /// True when this call produced a completed order.
    pub fn is_finalized(&self) -> bool {
        self.completed.is_some()
    }
}

pub fn is_valid_address(text: &str) -> bool {
    text.trim().chars().count() >= MIN_ADDRESS_LEN
}

pub fn is_valid_phone(text: &str) -> bool {
    PHONE_PATTERN.is_match(text.trim())
}

/// Transition table plus the catalog and store it operates on.
#[derive(Debug, Clone)]
pub struct OrderMachine {
    catalog: Arc<Catalog>,
    store: Arc<SessionStore>,
}

impl OrderMachine {
    pub fn new(catalog: Arc<Catalog>, store: Arc<SessionStore>) -> Self {
        Self { catalog, store }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Apply one event to the conversation's session.
    ///
    /// First contact from an untracked conversation creates the session in
    /// `AwaitingAddress` and answers with the welcome prompt, whatever the
    /// event was. A finalizing event removes the session before returning.
    pub fn handle(
        &self,
        conversation_id: &ConversationId,
        requester: &Requester,
        event: OrderEvent,
    ) -> Outcome {
        self.store.with_session(conversation_id, |slot| {
            let Some(session) = slot.as_mut() else {
                debug!(conversation = %conversation_id, "First contact; creating session");
                *slot = Some(Session::new(conversation_id.clone(), requester.clone()));
                return self.welcome();
            };

            session.touch();
            let outcome = self.transition(session, requester, event);
            if outcome.is_finalized() {
                *slot = None;
            }
            outcome
        })
    }

    fn transition(&self, session: &mut Session, requester: &Requester, event: OrderEvent) -> Outcome {
        let from = session.state;
        let outcome = match (from, event) {
            (_, OrderEvent::Start) => {
                *session = Session::new(session.conversation_id.clone(), requester.clone());
                self.welcome()
            }
            (OrderState::AwaitingAddress, OrderEvent::Text(text)) => self.on_address(session, &text),
            (OrderState::AwaitingItem, OrderEvent::ItemSelected(id)) => self.on_item(session, &id),
            (OrderState::AwaitingPhone, OrderEvent::Text(text)) => self.on_phone(session, &text),
            (OrderState::AwaitingItem, OrderEvent::Text(_)) => Outcome::rejected(
                from,
                Rejection::UnexpectedEvent,
                vec![self.selection_prompt(ITEM_REMINDER)],
            ),
            (_, OrderEvent::ItemSelected(_)) => {
                Outcome::rejected(from, Rejection::UnexpectedEvent, Vec::new())
            }
        };
        debug!(
            conversation = %session.conversation_id,
            from = %from,
            to = ?outcome.state,
            rejection = ?outcome.rejection,
            "Order transition"
        );
        outcome
    }

    fn welcome(&self) -> Outcome {
        Outcome {
            started: true,
            ..Outcome::advanced(
                OrderState::AwaitingAddress,
                vec![OutboundMessage::Text(WELCOME_PROMPT.to_string())],
            )
        }
    }

    fn on_address(&self, session: &mut Session, text: &str) -> Outcome {
        if !is_valid_address(text) {
            return Outcome::rejected(
                session.state,
                Rejection::AddressTooShort,
                vec![OutboundMessage::Text(ADDRESS_RETRY.to_string())],
            );
        }
        session.address = Some(text.trim().to_string());
        session.state = OrderState::AwaitingItem;
        Outcome::advanced(session.state, vec![self.selection_prompt(ITEM_PROMPT)])
    }

    fn on_item(&self, session: &mut Session, item_id: &str) -> Outcome {
        let Some(entry) = self.catalog.lookup(item_id) else {
            return Outcome::rejected(
                session.state,
                Rejection::UnknownItem,
                vec![OutboundMessage::Text(ITEM_UNAVAILABLE.to_string())],
            );
        };
        session.item = Some(SelectedItem::from(entry));
        session.state = OrderState::AwaitingPhone;
        Outcome::advanced(
            session.state,
            vec![
                OutboundMessage::SelectionMade(format!("You've selected: {}.", entry.name)),
                OutboundMessage::Text(PHONE_PROMPT.to_string()),
            ],
        )
    }

    fn on_phone(&self, session: &mut Session, text: &str) -> Outcome {
        if !is_valid_phone(text) {
            return Outcome::rejected(
                session.state,
                Rejection::InvalidPhone,
                vec![OutboundMessage::Text(PHONE_RETRY.to_string())],
            );
        }
        session.phone = Some(text.trim().to_string());
        match session.complete() {
            Some(order) => Outcome {
                completed: Some(order),
                ..Default::default()
            },
            // Unreachable while the state invariants hold; restart rather than panic.
            None => {
                *session = Session::new(session.conversation_id.clone(), session.requester.clone());
                self.welcome()
            }
        }
    }

    fn selection_prompt(&self, text: &str) -> OutboundMessage {
        OutboundMessage::Choice {
            text: text.to_string(),
            options: self
                .catalog
                .list()
                .iter()
                .map(|entry| SelectOption {
                    id: entry.id.clone(),
                    label: entry.option_label(),
                })
                .collect(),
        }
    }
}
