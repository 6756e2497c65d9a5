//! Core types: sender, chat, message, callback query, the inbound [`Update`] union,
//! and the outbound send options (parse mode, inline keyboards, media).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sender identity (id, username, names).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl User {
    /// Identity with only an id; names unknown.
    pub fn with_id(id: i64) -> Self {
        Self {
            id,
            username: None,
            first_name: None,
            last_name: None,
        }
    }
}

/// Kind of chat as reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
}

/// Chat (private, group, or channel) identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    pub kind: ChatKind,
}

impl Chat {
    pub fn private(id: i64) -> Self {
        Self {
            id,
            kind: ChatKind::Private,
        }
    }

    /// Group or supergroup; the chats where admin gating applies.
    pub fn is_group(&self) -> bool {
        matches!(self.kind, ChatKind::Group | ChatKind::Supergroup)
    }
}

/// A single inbound text message (or channel post).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: i32,
    pub chat: Chat,
    /// Absent for anonymous channel posts.
    pub from: Option<User>,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Text message from `sender_id` in `chat`.
    pub fn text(id: i32, chat: Chat, sender_id: i64, text: impl Into<String>) -> Self {
        Self {
            id,
            chat,
            from: Some(User::with_id(sender_id)),
            text: text.into(),
            created_at: Utc::now(),
        }
    }

    pub fn sender_id(&self) -> Option<i64> {
        self.from.as_ref().map(|u| u.id)
    }

    pub fn is_command(&self) -> bool {
        self.text.starts_with('/')
    }

    /// Command name without the leading slash and without a `@botname` suffix.
    /// `None` when the text is not a command.
    pub fn command(&self) -> Option<&str> {
        if !self.is_command() {
            return None;
        }
        let rest = &self.text[1..];
        let end = rest.find(|c: char| c == ' ' || c == '@').unwrap_or(rest.len());
        Some(&rest[..end])
    }

    /// Trimmed text after the first space of a command; empty when none.
    pub fn command_arguments(&self) -> &str {
        if !self.is_command() {
            return "";
        }
        let rest = self.text[1..].trim();
        match rest.find(' ') {
            Some(i) => rest[i + 1..].trim(),
            None => "",
        }
    }
}

/// Press of an inline keyboard button.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    /// Message carrying the keyboard; absent for inline-mode messages.
    pub message: Option<Message>,
    pub data: Option<String>,
    pub inline_message_id: Option<String>,
}

/// Inbound event: exactly one of message or callback query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Update {
    Message(Message),
    CallbackQuery(CallbackQuery),
}

impl Update {
    /// Chat the update belongs to. Callback queries without a message fall back to the
    /// sender's private chat.
    pub fn chat_id(&self) -> i64 {
        match self {
            Update::Message(m) => m.chat.id,
            Update::CallbackQuery(q) => q.message.as_ref().map(|m| m.chat.id).unwrap_or(q.from.id),
        }
    }

    pub fn sender_id(&self) -> Option<i64> {
        match self {
            Update::Message(m) => m.sender_id(),
            Update::CallbackQuery(q) => Some(q.from.id),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseMode {
    #[default]
    Plain,
    Html,
    Markdown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineButton {
    pub text: String,
    pub url: Option<String>,
    pub callback_data: Option<String>,
}

impl InlineButton {
    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            url: None,
            callback_data: Some(data.into()),
        }
    }
}

/// Inline keyboard: rows of buttons.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboard {
    pub rows: Vec<Vec<InlineButton>>,
}

/// Options for an outgoing text message.
#[derive(Debug, Clone, Default)]
pub struct MessageOptions {
    /// Reply to this message id in the same chat.
    pub reply_to: Option<i32>,
    pub parse_mode: ParseMode,
    /// Prompt text (by key) appended after a blank line; resolved by the session layer.
    pub prompt_key: Option<String>,
    pub reply_markup: Option<InlineKeyboard>,
}

/// Optional video attributes; zero fields are not sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VideoMeta {
    pub duration: u32,
    pub width: u32,
    pub height: u32,
}

/// File content uploaded from memory.
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub name: String,
    pub data: Vec<u8>,
}

impl MediaFile {
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }
}
