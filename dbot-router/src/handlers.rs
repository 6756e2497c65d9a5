//! Application-facing handler traits and the bot delegate.

use async_trait::async_trait;
use dbot_core::{CallbackQuery, Message, Result};
use storage::Preference;

use crate::command::CmdResult;
use crate::context::SessionContext;
use crate::session::Session;

/// Handler of a named command, invoked for `/name args` and for every plain-text message
/// while the command is active (then `args` is the message text).
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(
        &self,
        ctx: &mut SessionContext<'_>,
        args: &str,
        message: &Message,
    ) -> Result<CmdResult>;
}

/// Handler of plain text received while the session is idle.
#[async_trait]
pub trait TextHandler: Send + Sync {
    async fn handle(&self, ctx: &mut SessionContext<'_>, text: &str, message: &Message) -> Result<()>;
}

/// Continuation of an option picker sent with [`SessionContext::send_query`], registered by
/// name. Receives the label of the chosen option.
#[async_trait]
pub trait QueryHandler: Send + Sync {
    async fn handle(
        &self,
        ctx: &mut SessionContext<'_>,
        answer: &str,
        query: &CallbackQuery,
    ) -> Result<()>;
}

/// Application hooks around user and preference loading. Every method defaults to a no-op.
pub trait BotDelegate: Send + Sync {
    /// Initial application data for a user seen for the first time.
    fn new_user_data(&self) -> serde_json::Value {
        serde_json::Value::Null
    }

    /// Called for every session loaded at startup and for every newly created one.
    fn did_load_user(&self, _session: &Session) {}

    /// Called after each successful preference (re)load.
    fn did_load_preference(&self, _preference: &Preference) {}
}

/// Delegate that keeps every default.
pub struct NoopDelegate;

impl BotDelegate for NoopDelegate {}
