//! Shared fixtures for router integration tests: a recording [`SendPort`], a user store that
//! always fails, scripted handlers, and update builders.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dbot_core::{
    CallbackQuery, Chat, ChatKind, DbotError, InlineKeyboard, MediaFile, Message, MessageOptions,
    Result, SendPort, Update, User, VideoMeta,
};
use dbot_router::{
    CmdResult, CommandHandler, NoopDelegate, QueryHandler, Router, RouterConfig, Services,
    SessionContext, TextHandler,
};
use storage::{
    InMemoryUserStore, Preference, StaticPreferenceStore, StorageError, UserRecord, UserStore,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Text {
        chat_id: i64,
        text: String,
        reply_to: Option<i32>,
        keyboard: Option<InlineKeyboard>,
    },
    Media {
        chat_id: i64,
        kind: &'static str,
        name: String,
    },
    Answer {
        id: String,
    },
}

/// How sends fail while a failure is set on [`MockSender`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendFailure {
    Forbidden,
    ChatNotFound,
    /// Any error that does not mean the chat is unreachable.
    Other,
}

impl SendFailure {
    fn error(self) -> DbotError {
        match self {
            SendFailure::Forbidden => DbotError::Forbidden("bot was blocked by the user".into()),
            SendFailure::ChatNotFound => DbotError::ChatNotFound("chat not found".into()),
            SendFailure::Other => DbotError::Bot("Too Many Requests: retry after 5".into()),
        }
    }
}

/// Records every outgoing call. `set_failure(Some(..))` makes sends fail with that class of
/// error; `set_admins(None)` makes the administrator lookup fail.
pub struct MockSender {
    sent: Mutex<Vec<Sent>>,
    failure: Mutex<Option<SendFailure>>,
    admins: Mutex<Option<Vec<i64>>>,
}

impl MockSender {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
            admins: Mutex::new(Some(Vec::new())),
        })
    }

    pub fn set_failure(&self, failure: Option<SendFailure>) {
        *self.failure.lock().unwrap() = failure;
    }

    pub fn set_forbidden(&self, forbidden: bool) {
        self.set_failure(forbidden.then_some(SendFailure::Forbidden));
    }

    pub fn set_admins(&self, admins: Option<Vec<i64>>) {
        *self.admins.lock().unwrap() = admins;
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    /// `(chat_id, text)` of every text message, in order.
    pub fn texts(&self) -> Vec<(i64, String)> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Text { chat_id, text, .. } => Some((chat_id, text)),
                _ => None,
            })
            .collect()
    }

    pub fn last_keyboard(&self) -> Option<InlineKeyboard> {
        self.sent().into_iter().rev().find_map(|s| match s {
            Sent::Text { keyboard, .. } => keyboard,
            _ => None,
        })
    }

    pub fn answers(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Answer { id } => Some(id),
                _ => None,
            })
            .collect()
    }

    fn record(&self, item: Sent) -> Result<()> {
        if let Some(failure) = *self.failure.lock().unwrap() {
            return Err(failure.error());
        }
        self.sent.lock().unwrap().push(item);
        Ok(())
    }

    fn media(&self, chat_id: i64, kind: &'static str, file: MediaFile) -> Result<()> {
        self.record(Sent::Media {
            chat_id,
            kind,
            name: file.name,
        })
    }
}

#[async_trait]
impl SendPort for MockSender {
    async fn send_text(&self, chat_id: i64, text: &str, options: &MessageOptions) -> Result<()> {
        self.record(Sent::Text {
            chat_id,
            text: text.to_string(),
            reply_to: options.reply_to,
            keyboard: options.reply_markup.clone(),
        })
    }

    async fn send_photo(&self, chat_id: i64, photo: MediaFile) -> Result<()> {
        self.media(chat_id, "photo", photo)
    }

    async fn send_video(&self, chat_id: i64, video: MediaFile, _meta: Option<VideoMeta>) -> Result<()> {
        self.media(chat_id, "video", video)
    }

    async fn send_audio(&self, chat_id: i64, audio: MediaFile) -> Result<()> {
        self.media(chat_id, "audio", audio)
    }

    async fn send_document(&self, chat_id: i64, document: MediaFile) -> Result<()> {
        self.media(chat_id, "document", document)
    }

    async fn answer_callback(&self, callback_query_id: &str) -> Result<()> {
        self.sent.lock().unwrap().push(Sent::Answer {
            id: callback_query_id.to_string(),
        });
        Ok(())
    }

    async fn chat_administrator_ids(&self, _chat_id: i64) -> Result<Vec<i64>> {
        self.admins
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| DbotError::Bot("administrators unavailable".into()))
    }
}

/// User store whose writes always fail.
pub struct FailingUserStore;

#[async_trait]
impl UserStore for FailingUserStore {
    async fn get_all_users(&self) -> std::result::Result<Vec<UserRecord>, StorageError> {
        Ok(Vec::new())
    }

    async fn upsert_user(&self, _user: &UserRecord) -> std::result::Result<(), StorageError> {
        Err(StorageError::Database("disk full".into()))
    }
}

/// Router over `sender`, `users` and a static preference, with the preference loaded.
pub async fn router_with(
    sender: Arc<MockSender>,
    users: Arc<dyn UserStore>,
    preference: Preference,
) -> Router {
    let router = Router::new(
        Services {
            sender,
            users,
            preferences: Arc::new(StaticPreferenceStore::new(preference)),
            delegate: Arc::new(NoopDelegate),
        },
        RouterConfig::default(),
    );
    router.reload().await.unwrap();
    router
}

pub async fn default_router() -> (Router, Arc<MockSender>, Arc<InMemoryUserStore>) {
    let sender = MockSender::new();
    let users = Arc::new(InMemoryUserStore::new());
    let router = router_with(sender.clone(), users.clone(), Preference::default()).await;
    (router, sender, users)
}

pub fn message(chat_id: i64, text: &str) -> Update {
    Update::Message(Message::text(100, Chat::private(chat_id), chat_id, text))
}

pub fn group_message(chat_id: i64, sender_id: i64, text: &str) -> Update {
    let chat = Chat {
        id: chat_id,
        kind: ChatKind::Supergroup,
    };
    Update::Message(Message::text(100, chat, sender_id, text))
}

/// Callback pressed in `chat_id` on a message the bot sent there.
pub fn callback(chat_id: i64, id: &str, data: &str) -> Update {
    Update::CallbackQuery(CallbackQuery {
        id: id.to_string(),
        from: User::with_id(chat_id),
        message: Some(Message::text(99, Chat::private(chat_id), chat_id, "")),
        data: Some(data.to_string()),
        inline_message_id: None,
    })
}

/// State observed by a scripted handler when it was invoked.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub args: String,
    pub command: String,
    pub stage: String,
    pub had_args: bool,
}

type Script = dyn Fn(&mut SessionContext<'_>, &str) -> Result<CmdResult> + Send + Sync;

/// Command handler that records each call and then runs a synchronous script on the context.
pub struct ScriptedCommand {
    calls: Mutex<Vec<Call>>,
    script: Box<Script>,
}

impl ScriptedCommand {
    pub fn new<F>(script: F) -> Arc<Self>
    where
        F: Fn(&mut SessionContext<'_>, &str) -> Result<CmdResult> + Send + Sync + 'static,
    {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            script: Box::new(script),
        })
    }

    /// Handler that always returns `result` without touching the state.
    pub fn returning(result: CmdResult) -> Arc<Self> {
        Self::new(move |_, _| Ok(result))
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandHandler for ScriptedCommand {
    async fn handle(
        &self,
        ctx: &mut SessionContext<'_>,
        args: &str,
        _message: &Message,
    ) -> Result<CmdResult> {
        self.calls.lock().unwrap().push(Call {
            args: args.to_string(),
            command: ctx.command().command().to_string(),
            stage: ctx.command().stage().to_string(),
            had_args: ctx.command().has_args(),
        });
        (self.script)(ctx, args)
    }
}

/// Text handler that records texts and replies when `echo` is set.
pub struct RecordingText {
    pub texts: Mutex<Vec<String>>,
    pub echo: bool,
}

impl RecordingText {
    pub fn new(echo: bool) -> Arc<Self> {
        Arc::new(Self {
            texts: Mutex::new(Vec::new()),
            echo,
        })
    }

    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextHandler for RecordingText {
    async fn handle(&self, ctx: &mut SessionContext<'_>, text: &str, _message: &Message) -> Result<()> {
        self.texts.lock().unwrap().push(text.to_string());
        if self.echo {
            ctx.send_text(text).await?;
        }
        Ok(())
    }
}

/// Query continuation recording `(chat_id, answer)`.
pub struct RecordingQuery {
    pub answers: Mutex<Vec<(i64, String)>>,
}

impl RecordingQuery {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(Vec::new()),
        })
    }

    pub fn answers(&self) -> Vec<(i64, String)> {
        self.answers.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryHandler for RecordingQuery {
    async fn handle(&self, ctx: &mut SessionContext<'_>, answer: &str, _query: &CallbackQuery) -> Result<()> {
        self.answers
            .lock()
            .unwrap()
            .push((ctx.id(), answer.to_string()));
        Ok(())
    }
}

/// Command that presents an option picker continued by `continuation`.
pub struct PollCommand {
    pub options: Vec<String>,
    pub continuation: String,
}

#[async_trait]
impl CommandHandler for PollCommand {
    async fn handle(
        &self,
        ctx: &mut SessionContext<'_>,
        _args: &str,
        _message: &Message,
    ) -> Result<CmdResult> {
        ctx.send_query("Pick one", &self.options, &self.continuation)
            .await?;
        Ok(CmdResult::Processed)
    }
}
