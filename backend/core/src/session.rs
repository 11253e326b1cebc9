//! Per-conversation order session and the completed order it produces.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::{CatalogEntry, Price};

/// Opaque identifier scoping every session lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConversationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The remote user behind a conversation, as reported by the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    pub id: String,
    pub username: Option<String>,
    pub full_name: String,
}

impl Requester {
    pub fn new(id: impl Into<String>, username: Option<String>, full_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username,
            full_name: full_name.into(),
        }
    }

    /// `@username` when the user has one, otherwise their full name.
    pub fn display_name(&self) -> String {
        match self.username.as_deref() {
            Some(u) if !u.is_empty() => format!("@{u}"),
            _ => self.full_name.clone(),
        }
    }
}

/// Where a session currently is in the order flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    AwaitingAddress,
    AwaitingItem,
    AwaitingPhone,
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderState::AwaitingAddress => "awaiting_address",
            OrderState::AwaitingItem => "awaiting_item",
            OrderState::AwaitingPhone => "awaiting_phone",
        };
        f.write_str(s)
    }
}

/// Snapshot of the catalog entry taken at selection time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedItem {
    pub id: String,
    pub name: String,
    pub price: Price,
}

impl From<&CatalogEntry> for SelectedItem {
    fn from(entry: &CatalogEntry) -> Self {
        Self {
            id: entry.id.clone(),
            name: entry.name.clone(),
            price: entry.price,
        }
    }
}

/// One in-progress order for one conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub conversation_id: ConversationId,
    pub requester: Requester,
    pub state: OrderState,
    pub address: Option<String>,
    pub item: Option<SelectedItem>,
    pub phone: Option<String>,
    pub started_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl Session {
    pub fn new(conversation_id: ConversationId, requester: Requester) -> Self {
        let now = Utc::now();
        Self {
            conversation_id,
            requester,
            state: OrderState::AwaitingAddress,
            address: None,
            item: None,
            phone: None,
            started_at: now,
            last_activity: now,
        }
    }

    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Build the completed order once every field has been collected.
    ///
    /// Returns `None` while any of address, item, or phone is missing.
    pub fn complete(&self) -> Option<CompletedOrder> {
        let address = self.address.clone()?;
        let item = self.item.clone()?;
        let phone = self.phone.clone()?;
        Some(CompletedOrder {
            order_id: Uuid::new_v4(),
            conversation_id: self.conversation_id.clone(),
            requester_id: self.requester.id.clone(),
            requester_display_name: self.requester.display_name(),
            address,
            item_name: item.name,
            item_price: item.price,
            phone,
            timestamp: Utc::now(),
        })
    }
}

/// Finalized order handed to the notification sink. Never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedOrder {
    pub order_id: Uuid,
    pub conversation_id: ConversationId,
    pub requester_id: String,
    pub requester_display_name: String,
    pub address: String,
    pub item_name: String,
    pub item_price: Price,
    pub phone: String,
    pub timestamp: DateTime<Utc>,
}

impl CompletedOrder {
    /// Operator-facing summary text.
    pub fn summary(&self) -> String {
        format!(
            "✨ New Order Received! ✨\n\n\
             👤 User: {} (ID: {})\n\
             🏡 Address: {}\n\
             🛒 Item: {} (${})\n\
             📞 Phone: {}\n\n\
             -----------------------------------\n\
             Please contact the customer to confirm the order.",
            self.requester_display_name,
            self.requester_id,
            self.address,
            self.item_name,
            self.item_price,
            self.phone,
        )
    }
}
