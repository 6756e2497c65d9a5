//! # Router
//!
//! Resolves the session of each update (creating and persisting the user on first contact),
//! clears the blocked flag, and routes the update:
//!
//! - built-in commands (`start`, `botreload`, `botstat`) are answered inline;
//! - other commands pass group admin gating, then run their handler, resetting the command
//!   state when the command differs from the active one;
//! - plain text continues the active command, or goes to the free-text handler when idle;
//! - callback queries are acknowledged and, when they carry a pending-query token, delivered
//!   to the continuation registered under the query's name.
//!
//! Handler tables live behind their own lock and can be swapped at any time; handlers are
//! cloned out of the table before they run.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use dbot_core::{CallbackQuery, Message, MessageOptions, Result, SendPort, Update};
use dbot_dispatch::{CallbackToken, QueryStore, UpdateProcessor};
use storage::{Preference, PreferenceStore, UserRecord, UserStore};
use tracing::{debug, info, instrument, warn};

use crate::command::CmdResult;
use crate::context::{storage_error, SessionContext};
use crate::handlers::{BotDelegate, CommandHandler, QueryHandler, TextHandler};
use crate::session::{Session, SessionRegistry, SharedSession};

pub const CMD_START: &str = "start";
pub const CMD_BOT_RELOAD: &str = "botreload";
pub const CMD_BOT_STAT: &str = "botstat";

/// Sender id Telegram uses for anonymous group administrators.
pub const GROUP_ANONYMOUS_BOT: i64 = 1087968824;

/// External collaborators of the router.
#[derive(Clone)]
pub struct Services {
    pub sender: Arc<dyn SendPort>,
    pub users: Arc<dyn UserStore>,
    pub preferences: Arc<dyn PreferenceStore>,
    pub delegate: Arc<dyn BotDelegate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouterConfig {
    /// Bound on outstanding option pickers per session; older ones are evicted.
    pub max_pending_per_session: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_pending_per_session: 10,
        }
    }
}

#[derive(Default)]
struct HandlerTable {
    commands: HashMap<String, Arc<dyn CommandHandler>>,
    text: Option<Arc<dyn TextHandler>>,
    queries: HashMap<String, Arc<dyn QueryHandler>>,
}

pub struct Router {
    services: Services,
    sessions: SessionRegistry,
    queries: QueryStore,
    preference: RwLock<Arc<Preference>>,
    handlers: RwLock<HandlerTable>,
}

impl Router {
    pub fn new(services: Services, config: RouterConfig) -> Self {
        Self {
            services,
            sessions: SessionRegistry::new(),
            queries: QueryStore::new(config.max_pending_per_session),
            preference: RwLock::new(Arc::new(Preference::default())),
            handlers: RwLock::new(HandlerTable::default()),
        }
    }

    /// Registers (or replaces) the handler for `/command`. Built-in names stay reserved.
    pub fn register_command(&self, command: impl Into<String>, handler: Arc<dyn CommandHandler>) {
        let command = command.into();
        if is_builtin(&command) {
            warn!(command = %command, "Command name is reserved by a built-in; handler never runs");
        }
        info!(command = %command, "Command handler registered");
        self.handlers_mut().commands.insert(command, handler);
    }

    pub fn register_text_handler(&self, handler: Arc<dyn TextHandler>) {
        self.handlers_mut().text = Some(handler);
    }

    /// Registers the continuation named `name` for option pickers.
    pub fn register_query_handler(&self, name: impl Into<String>, handler: Arc<dyn QueryHandler>) {
        let name = name.into();
        info!(continuation = %name, "Query handler registered");
        self.handlers_mut().queries.insert(name, handler);
    }

    /// Current preference snapshot.
    pub fn preference(&self) -> Arc<Preference> {
        self.preference
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub async fn session(&self, id: i64) -> Option<SharedSession> {
        self.sessions.get(id).await
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.len().await
    }

    pub fn queries(&self) -> &QueryStore {
        &self.queries
    }

    /// Loads every stored user into a session, then the preference. Returns the number of
    /// sessions loaded. A failing preference load is logged and the defaults stay in place.
    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<usize> {
        let users = self
            .services
            .users
            .get_all_users()
            .await
            .map_err(storage_error)?;
        let count = users.len();
        for user in users {
            let session = self.sessions.insert(Session::new(user)).await;
            let session = session.lock().await;
            self.services.delegate.did_load_user(&session);
        }
        info!(sessions = count, "step: users loaded");

        if let Err(e) = self.reload().await {
            warn!(error = %e, "step: initial preference load failed, using defaults");
        }
        Ok(count)
    }

    /// Fetches the preference document (texts already decoded by the store), swaps it in
    /// and notifies the delegate.
    pub async fn reload(&self) -> Result<()> {
        let preference = self
            .services
            .preferences
            .load_preference()
            .await
            .map_err(storage_error)?;
        let preference = Arc::new(preference);
        *self
            .preference
            .write()
            .unwrap_or_else(PoisonError::into_inner) = preference.clone();
        self.services.delegate.did_load_preference(&preference);
        info!(admins = preference.admins.len(), "step: preference reloaded");
        Ok(())
    }

    fn handlers(&self) -> std::sync::RwLockReadGuard<'_, HandlerTable> {
        self.handlers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn handlers_mut(&self) -> std::sync::RwLockWriteGuard<'_, HandlerTable> {
        self.handlers.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn command_handler(&self, command: &str) -> Option<Arc<dyn CommandHandler>> {
        self.handlers().commands.get(command).cloned()
    }

    fn text_handler(&self) -> Option<Arc<dyn TextHandler>> {
        self.handlers().text.clone()
    }

    fn query_handler(&self, name: &str) -> Option<Arc<dyn QueryHandler>> {
        self.handlers().queries.get(name).cloned()
    }

    /// Session of `chat_id`, created, persisted and announced to the delegate on first
    /// contact. `None` when persisting the new user fails.
    async fn resolve_session(&self, chat_id: i64) -> Option<SharedSession> {
        if let Some(session) = self.sessions.get(chat_id).await {
            return Some(session);
        }

        let user = UserRecord::new(chat_id, self.services.delegate.new_user_data());
        if let Err(e) = self.services.users.upsert_user(&user).await {
            warn!(chat_id, error = %e, "step: new user not persisted, update dropped");
            return None;
        }
        let session = self.sessions.insert(Session::new(user)).await;
        self.services.delegate.did_load_user(&*session.lock().await);
        info!(chat_id, "step: new session created");
        Some(session)
    }

    /// Any inbound update proves the chat reachable again.
    async fn clear_blocked(&self, session: &mut Session) {
        if !session.user.blocked {
            return;
        }
        session.user.blocked = false;
        if let Err(e) = self.services.users.upsert_user(&session.user).await {
            warn!(chat_id = session.id, error = %e, "Failed to persist cleared blocked flag");
        }
        debug!(chat_id = session.id, "Blocked flag cleared");
    }

    async fn process_update(&self, update: &Update) {
        let chat_id = update.chat_id();
        let Some(shared) = self.resolve_session(chat_id).await else {
            return;
        };
        let mut session = shared.lock().await;
        self.clear_blocked(&mut session).await;

        let mut ctx = SessionContext::new(
            &mut session,
            self.services.sender.as_ref(),
            self.services.users.as_ref(),
            &self.queries,
            self.preference(),
        );
        match update {
            Update::Message(message) => self.route_message(&mut ctx, message).await,
            Update::CallbackQuery(query) => self.route_callback(&mut ctx, query).await,
        }
    }

    async fn route_message(&self, ctx: &mut SessionContext<'_>, message: &Message) {
        if let Some(command) = message.command() {
            self.process_command(ctx, command, message.command_arguments(), message)
                .await;
        } else if !ctx.command().is_idle() {
            let command = ctx.command().command().to_string();
            self.process_command(ctx, &command, &message.text, message)
                .await;
        } else {
            self.process_text(ctx, message).await;
        }
    }

    async fn process_command(
        &self,
        ctx: &mut SessionContext<'_>,
        command: &str,
        args: &str,
        message: &Message,
    ) {
        if self.process_builtin(ctx, command, message).await {
            return;
        }

        if ctx.preference().only_admins_can_command_in_group
            && message.chat.is_group()
            && !self.sender_is_chat_admin(message).await
        {
            info!(chat_id = ctx.id(), command, "step: non-admin command in group dropped");
            return;
        }

        let Some(handler) = self.command_handler(command) else {
            debug!(chat_id = ctx.id(), command, "No handler for command; update dropped");
            return;
        };

        if ctx.command_mut().begin(command) {
            debug!(chat_id = ctx.id(), command, "Command state reset");
        }
        info!(chat_id = ctx.id(), command, "step: command handler processing");
        let result = match handler.handle(ctx, args, message).await {
            Ok(result) => result,
            Err(e) => {
                warn!(chat_id = ctx.id(), command, error = %e, "Command handler failed");
                CmdResult::Processed
            }
        };
        if result == CmdResult::Processed {
            ctx.command_mut().reset();
        }
        info!(chat_id = ctx.id(), command, result = ?result, "step: command handler done");
    }

    /// Handles the built-in commands. Returns false when `command` is not one of them.
    async fn process_builtin(
        &self,
        ctx: &mut SessionContext<'_>,
        command: &str,
        message: &Message,
    ) -> bool {
        let result = match command {
            CMD_START => {
                let options = MessageOptions {
                    reply_to: Some(message.id),
                    prompt_key: Some(CMD_START.to_string()),
                    ..MessageOptions::default()
                };
                ctx.send_text_with("Greetings.", options).await
            }
            CMD_BOT_RELOAD => {
                if !ctx.preference().is_admin(message.chat.id) {
                    return true;
                }
                match self.reload().await {
                    Ok(()) => ctx.reply_text("Done.", message.id).await,
                    Err(e) => Err(e),
                }
            }
            CMD_BOT_STAT => {
                if !ctx.preference().is_admin(message.chat.id) {
                    return true;
                }
                let total = self.sessions.len().await;
                ctx.reply_text(&format!("Total Users: {}", total), message.id)
                    .await
            }
            _ => return false,
        };
        if let Err(e) = result {
            warn!(chat_id = ctx.id(), command, error = %e, "Built-in command failed");
        }
        true
    }

    /// Group gating: the sender must be one of the chat's administrators, or the anonymous
    /// admin identity. Fails closed when the administrator list cannot be fetched.
    async fn sender_is_chat_admin(&self, message: &Message) -> bool {
        let admins = match self
            .services
            .sender
            .chat_administrator_ids(message.chat.id)
            .await
        {
            Ok(admins) => admins,
            Err(e) => {
                warn!(chat_id = message.chat.id, error = %e, "Failed to fetch chat administrators");
                return false;
            }
        };
        match message.sender_id() {
            Some(id) => admins.contains(&id) || id == GROUP_ANONYMOUS_BOT,
            None => false,
        }
    }

    async fn process_text(&self, ctx: &mut SessionContext<'_>, message: &Message) {
        let Some(handler) = self.text_handler() else {
            debug!(chat_id = ctx.id(), "No text handler; message ignored");
            return;
        };
        info!(chat_id = ctx.id(), "step: text handler processing");
        if let Err(e) = handler.handle(ctx, &message.text, message).await {
            warn!(chat_id = ctx.id(), error = %e, "Text handler failed");
        }
    }

    async fn route_callback(&self, ctx: &mut SessionContext<'_>, query: &CallbackQuery) {
        if let Err(e) = ctx.answer_callback(&query.id).await {
            warn!(chat_id = ctx.id(), error = %e, "Failed to answer callback query");
        }

        let Some(token) = query.data.as_deref().and_then(CallbackToken::parse) else {
            debug!(chat_id = ctx.id(), "Callback without query token ignored");
            return;
        };
        let Some(pending) = self.queries.take(token.query_id) else {
            debug!(chat_id = ctx.id(), query_id = token.query_id, "Unknown or consumed query");
            return;
        };
        if pending.session_id != ctx.id() {
            warn!(
                chat_id = ctx.id(),
                owner = pending.session_id,
                query_id = token.query_id,
                "Callback from a chat that does not own the query; ignored"
            );
            return;
        }
        let Some(answer) = pending.answer(token.key) else {
            debug!(chat_id = ctx.id(), query_id = token.query_id, key = token.key, "Unknown option key");
            return;
        };
        let Some(handler) = self.query_handler(&pending.continuation) else {
            warn!(continuation = %pending.continuation, "No query handler registered");
            return;
        };

        info!(
            chat_id = ctx.id(),
            query_id = token.query_id,
            continuation = %pending.continuation,
            "step: query handler processing"
        );
        if let Err(e) = handler.handle(ctx, answer, query).await {
            warn!(chat_id = ctx.id(), error = %e, "Query handler failed");
        }
    }
}

fn is_builtin(command: &str) -> bool {
    matches!(command, CMD_START | CMD_BOT_RELOAD | CMD_BOT_STAT)
}

#[async_trait]
impl UpdateProcessor for Router {
    #[instrument(skip(self, update), fields(chat_id = update.chat_id()))]
    async fn process(&self, update: Update) {
        info!("step: router started");
        self.process_update(&update).await;
        info!("step: router finished");
    }
}
