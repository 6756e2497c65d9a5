//! Adapters from Telegram (teloxide) types to dbot_core types.
//! Depends only on teloxide and dbot_core type definitions.

use dbot_core::{CallbackQuery, Chat, ChatKind, Message, Update, User};
use teloxide::types::{MaybeInaccessibleMessage, UpdateKind};

/// Wraps a teloxide User for conversion to core [`User`].
pub struct TelegramUserWrapper<'a>(pub &'a teloxide::types::User);

impl<'a> TelegramUserWrapper<'a> {
    pub fn to_core(&self) -> User {
        User {
            id: self.0.id.0 as i64,
            username: self.0.username.clone(),
            first_name: Some(self.0.first_name.clone()),
            last_name: self.0.last_name.clone(),
        }
    }
}

/// Wraps a teloxide Chat for conversion to core [`Chat`].
pub struct TelegramChatWrapper<'a>(pub &'a teloxide::types::Chat);

impl<'a> TelegramChatWrapper<'a> {
    pub fn to_core(&self) -> Chat {
        let chat = self.0;
        let kind = if chat.is_supergroup() {
            ChatKind::Supergroup
        } else if chat.is_group() {
            ChatKind::Group
        } else if chat.is_channel() {
            ChatKind::Channel
        } else {
            ChatKind::Private
        };
        Chat {
            id: chat.id.0,
            kind,
        }
    }
}

/// Wraps a teloxide Message (or channel post) for conversion to core [`Message`].
/// Non-text messages convert with empty text.
pub struct TelegramMessageWrapper<'a>(pub &'a teloxide::types::Message);

impl<'a> TelegramMessageWrapper<'a> {
    pub fn to_core(&self) -> Message {
        Message {
            id: self.0.id.0,
            chat: TelegramChatWrapper(&self.0.chat).to_core(),
            from: self.0.from.as_ref().map(|u| TelegramUserWrapper(u).to_core()),
            text: self.0.text().unwrap_or("").to_string(),
            created_at: self.0.date,
        }
    }
}

/// Wraps a teloxide CallbackQuery for conversion to core [`CallbackQuery`].
pub struct TelegramCallbackWrapper<'a>(pub &'a teloxide::types::CallbackQuery);

impl<'a> TelegramCallbackWrapper<'a> {
    pub fn to_core(&self) -> CallbackQuery {
        let q = self.0;
        CallbackQuery {
            id: q.id.0.clone(),
            from: TelegramUserWrapper(&q.from).to_core(),
            message: q.message.as_ref().map(keyboard_message),
            data: q.data.clone(),
            inline_message_id: q.inline_message_id.clone(),
        }
    }
}

/// Message carrying the pressed keyboard. An inaccessible (too old) message still tells
/// which chat and message the keyboard belonged to.
fn keyboard_message(message: &MaybeInaccessibleMessage) -> Message {
    match message.regular_message() {
        Some(m) => TelegramMessageWrapper(m).to_core(),
        None => Message {
            id: message.id().0,
            chat: TelegramChatWrapper(message.chat()).to_core(),
            from: None,
            text: String::new(),
            created_at: chrono::Utc::now(),
        },
    }
}

/// Converts a teloxide update into a core [`Update`]. Messages and channel posts become
/// [`Update::Message`]; callback queries become [`Update::CallbackQuery`]; every other kind
/// is not handled and yields `None`.
pub fn to_core_update(update: &teloxide::types::Update) -> Option<Update> {
    match &update.kind {
        UpdateKind::Message(m) | UpdateKind::ChannelPost(m) => {
            Some(Update::Message(TelegramMessageWrapper(m).to_core()))
        }
        UpdateKind::CallbackQuery(q) => {
            Some(Update::CallbackQuery(TelegramCallbackWrapper(q).to_core()))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> teloxide::types::Update {
        // teloxide's UpdateKind deserializer needs borrowed keys; parse from text like the wire path.
        serde_json::from_str(&value.to_string()).unwrap()
    }

    /// **Test: TelegramUserWrapper converts teloxide User to core User with correct id, username, first_name, last_name.**
    #[test]
    fn test_telegram_user_wrapper_to_core() {
        let user: teloxide::types::User = serde_json::from_value(json!({
            "id": 123,
            "is_bot": false,
            "first_name": "Test",
            "last_name": "User",
            "username": "testuser",
            "language_code": "en"
        }))
        .unwrap();

        let core_user = TelegramUserWrapper(&user).to_core();

        assert_eq!(core_user.id, 123);
        assert_eq!(core_user.username, Some("testuser".to_string()));
        assert_eq!(core_user.first_name, Some("Test".to_string()));
        assert_eq!(core_user.last_name, Some("User".to_string()));
    }

    /// **Test: A private text message converts with chat, sender and text.**
    #[test]
    fn test_message_update() {
        let update = parse(json!({
            "update_id": 1,
            "message": {
                "message_id": 5,
                "date": 1700000000,
                "chat": {"id": 42, "type": "private", "first_name": "Ann"},
                "from": {"id": 42, "is_bot": false, "first_name": "Ann"},
                "text": "/start@demo_bot"
            }
        }));

        let Some(Update::Message(message)) = to_core_update(&update) else {
            panic!("expected a message update");
        };
        assert_eq!(message.id, 5);
        assert_eq!(message.chat, Chat::private(42));
        assert_eq!(message.sender_id(), Some(42));
        assert_eq!(message.command(), Some("start"));
    }

    /// **Test: Supergroup chats keep their kind so admin gating applies.**
    #[test]
    fn test_supergroup_message() {
        let update = parse(json!({
            "update_id": 2,
            "message": {
                "message_id": 6,
                "date": 1700000000,
                "chat": {"id": -1001, "type": "supergroup", "title": "Ops"},
                "from": {"id": 7, "is_bot": false, "first_name": "Bo"},
                "text": "hello"
            }
        }));

        let Some(Update::Message(message)) = to_core_update(&update) else {
            panic!("expected a message update");
        };
        assert_eq!(message.chat.kind, ChatKind::Supergroup);
        assert!(message.chat.is_group());
    }

    /// **Test: Channel posts are delivered as messages without a sender.**
    #[test]
    fn test_channel_post_is_message() {
        let update = parse(json!({
            "update_id": 3,
            "channel_post": {
                "message_id": 1,
                "date": 1700000000,
                "chat": {"id": -1002, "type": "channel", "title": "News"},
                "text": "/digest"
            }
        }));

        let Some(Update::Message(message)) = to_core_update(&update) else {
            panic!("expected a message update");
        };
        assert_eq!(message.chat.kind, ChatKind::Channel);
        assert_eq!(message.sender_id(), None);
        assert_eq!(message.text, "/digest");
    }

    /// **Test: Callback queries carry id, data and the originating chat.**
    #[test]
    fn test_callback_update() {
        let update = parse(json!({
            "update_id": 4,
            "callback_query": {
                "id": "cb-1",
                "from": {"id": 7, "is_bot": false, "first_name": "Bo"},
                "chat_instance": "ci",
                "data": "q:3:1",
                "message": {
                    "message_id": 9,
                    "date": 1700000000,
                    "chat": {"id": 7, "type": "private", "first_name": "Bo"},
                    "text": "Pick one"
                }
            }
        }));

        let Some(Update::CallbackQuery(query)) = to_core_update(&update) else {
            panic!("expected a callback update");
        };
        assert_eq!(query.id, "cb-1");
        assert_eq!(query.data.as_deref(), Some("q:3:1"));
        assert_eq!(query.message.as_ref().map(|m| m.id), Some(9));
        assert_eq!(Update::CallbackQuery(query).chat_id(), 7);
    }

    /// **Test: Other update kinds are ignored.**
    #[test]
    fn test_edited_message_is_ignored() {
        let update = parse(json!({
            "update_id": 5,
            "edited_message": {
                "message_id": 5,
                "date": 1700000000,
                "edit_date": 1700000100,
                "chat": {"id": 42, "type": "private", "first_name": "Ann"},
                "from": {"id": 42, "is_bot": false, "first_name": "Ann"},
                "text": "edited"
            }
        }));
        assert!(to_core_update(&update).is_none());
    }
}
