//! The capability set handed to handlers for one update.
//!
//! A [`SessionContext`] borrows the locked session plus the services a handler may use:
//! the send port, the user store, the pending-query store and a snapshot of the current
//! preference. Every send goes through [`SessionContext::check`], which marks the user
//! blocked and persists the record when the chat turned out to be unreachable.

use std::sync::Arc;

use dbot_core::{
    DbotError, InlineKeyboard, MediaFile, MessageOptions, Result, SendPort, VideoMeta,
};
use dbot_dispatch::QueryStore;
use storage::{Preference, StorageError, UserRecord, UserStore};
use tracing::{info, warn};

use crate::command::CommandState;
use crate::session::Session;

pub(crate) fn storage_error(e: StorageError) -> DbotError {
    DbotError::Storage(e.to_string())
}

pub struct SessionContext<'a> {
    session: &'a mut Session,
    sender: &'a dyn SendPort,
    users: &'a dyn UserStore,
    queries: &'a QueryStore,
    preference: Arc<Preference>,
}

impl<'a> SessionContext<'a> {
    pub fn new(
        session: &'a mut Session,
        sender: &'a dyn SendPort,
        users: &'a dyn UserStore,
        queries: &'a QueryStore,
        preference: Arc<Preference>,
    ) -> Self {
        Self {
            session,
            sender,
            users,
            queries,
            preference,
        }
    }

    /// Chat id of the session.
    pub fn id(&self) -> i64 {
        self.session.id
    }

    pub fn session(&self) -> &Session {
        self.session
    }

    pub fn user(&self) -> &UserRecord {
        &self.session.user
    }

    /// Mutable user record; call [`save_user`](Self::save_user) to persist changes.
    pub fn user_mut(&mut self) -> &mut UserRecord {
        &mut self.session.user
    }

    pub fn command(&self) -> &CommandState {
        &self.session.command
    }

    pub fn command_mut(&mut self) -> &mut CommandState {
        &mut self.session.command
    }

    pub fn preference(&self) -> &Preference {
        &self.preference
    }

    pub async fn save_user(&self) -> Result<()> {
        self.users
            .upsert_user(&self.session.user)
            .await
            .map_err(storage_error)
    }

    pub async fn send_text(&mut self, text: &str) -> Result<()> {
        self.send_text_with(text, MessageOptions::default()).await
    }

    pub async fn reply_text(&mut self, text: &str, reply_to: i32) -> Result<()> {
        self.send_text_with(
            text,
            MessageOptions {
                reply_to: Some(reply_to),
                ..MessageOptions::default()
            },
        )
        .await
    }

    /// Sends `text`, followed by a blank line and the prompt named by `options.prompt_key`
    /// when that prompt is configured and non-empty.
    pub async fn send_text_with(&mut self, text: &str, options: MessageOptions) -> Result<()> {
        let text = match options.prompt_key.as_deref().and_then(|k| self.preference.prompt(k)) {
            Some(prompt) => format!("{}\n\n{}", text, prompt),
            None => text.to_string(),
        };
        let result = self.sender.send_text(self.session.id, &text, &options).await;
        self.check(result).await
    }

    /// Sends `prompt` with one button per option. The chosen label is delivered to the
    /// query handler registered as `continuation`. Sends nothing when `options` is empty.
    pub async fn send_query<S: AsRef<str>>(
        &mut self,
        prompt: &str,
        options: &[S],
        continuation: &str,
    ) -> Result<()> {
        let Some(keyboard) = self.queries.create(self.session.id, options, continuation) else {
            return Ok(());
        };
        self.send_text_with(prompt, with_markup(keyboard)).await
    }

    pub async fn send_photo(&mut self, photo: MediaFile) -> Result<()> {
        let result = self.sender.send_photo(self.session.id, photo).await;
        self.check(result).await
    }

    pub async fn send_video(&mut self, video: MediaFile, meta: Option<VideoMeta>) -> Result<()> {
        let result = self.sender.send_video(self.session.id, video, meta).await;
        self.check(result).await
    }

    pub async fn send_audio(&mut self, audio: MediaFile) -> Result<()> {
        let result = self.sender.send_audio(self.session.id, audio).await;
        self.check(result).await
    }

    pub async fn send_document(&mut self, document: MediaFile) -> Result<()> {
        let result = self.sender.send_document(self.session.id, document).await;
        self.check(result).await
    }

    pub async fn answer_callback(&mut self, callback_query_id: &str) -> Result<()> {
        let result = self.sender.answer_callback(callback_query_id).await;
        self.check(result).await
    }

    /// Passes `result` through unchanged. On a forbidden / chat-not-found error the user is
    /// first marked blocked and persisted.
    async fn check(&mut self, result: Result<()>) -> Result<()> {
        if let Err(e) = &result {
            if e.is_unreachable_chat() {
                self.session.user.blocked = true;
                info!(chat_id = self.session.id, error = %e, "Chat unreachable; user marked blocked");
                if let Err(store_err) = self.users.upsert_user(&self.session.user).await {
                    warn!(chat_id = self.session.id, error = %store_err, "Failed to persist blocked flag");
                }
            }
        }
        result
    }
}

fn with_markup(keyboard: InlineKeyboard) -> MessageOptions {
    MessageOptions {
        reply_markup: Some(keyboard),
        ..MessageOptions::default()
    }
}
