//! Mapping between Telegram chats/users and transport-agnostic order types.

use orderdesk_core::{ConversationId, Requester};
use teloxide::types::{ChatId, User, UserId};

const CONVERSATION_PREFIX: &str = "tg-";
const SELECTION_PREFIX: &str = "select_item:";

/// Telegram's hard limit on `callback_data`, in bytes.
pub const MAX_CALLBACK_DATA_LEN: usize = 64;

/// Conversation id for one user in one chat (`tg-<chat_id>:<user_id>`).
///
/// Members of a group chat each get their own order.
pub fn conversation_for(chat_id: ChatId, user_id: UserId) -> ConversationId {
    ConversationId::new(format!("{CONVERSATION_PREFIX}{}:{}", chat_id.0, user_id.0))
}

/// Chat a conversation replies into; `None` for ids from other transports.
pub fn chat_for_conversation(conversation: &ConversationId) -> Option<ChatId> {
    let (chat, _user) = conversation
        .as_str()
        .strip_prefix(CONVERSATION_PREFIX)?
        .split_once(':')?;
    chat.parse().ok().map(ChatId)
}

pub fn requester_from_user(user: &User) -> Requester {
    Requester::new(user.id.0.to_string(), user.username.clone(), user.full_name())
}

/// Callback payload for an item button, or `None` if it would exceed Telegram's limit.
pub fn encode_selection(item_id: &str) -> Option<String> {
    let data = format!("{SELECTION_PREFIX}{item_id}");
    (data.len() <= MAX_CALLBACK_DATA_LEN).then_some(data)
}

/// Item id carried by an item button's callback payload.
pub fn decode_selection(data: &str) -> Option<&str> {
    data.strip_prefix(SELECTION_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_carries_chat_and_user() {
        let conv = conversation_for(ChatId(-100_123), UserId(42));
        assert_eq!(conv.as_str(), "tg--100123:42");
        assert_eq!(chat_for_conversation(&conv), Some(ChatId(-100_123)));
    }

    #[test]
    fn group_members_get_separate_conversations() {
        let group = ChatId(-100_555);
        let alice = conversation_for(group, UserId(1));
        let bob = conversation_for(group, UserId(2));
        assert_ne!(alice, bob);
        assert_eq!(chat_for_conversation(&alice), chat_for_conversation(&bob));
    }

    #[test]
    fn foreign_conversation_has_no_chat() {
        assert_eq!(chat_for_conversation(&ConversationId::new("slack-C1")), None);
        assert_eq!(chat_for_conversation(&ConversationId::new("tg-abc:1")), None);
        assert_eq!(chat_for_conversation(&ConversationId::new("tg-100")), None);
    }

    #[test]
    fn selection_payload_keeps_ids_with_separators() {
        let data = encode_selection("vodka - absolute").unwrap();
        assert_eq!(data, "select_item:vodka - absolute");
        assert_eq!(decode_selection(&data), Some("vodka - absolute"));
        assert_eq!(decode_selection("something_else"), None);
    }

    #[test]
    fn oversized_selection_is_rejected() {
        assert!(encode_selection(&"x".repeat(60)).is_none());
    }
}
