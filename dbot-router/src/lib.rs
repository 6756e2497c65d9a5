//! # dbot-router
//!
//! Session layer of the bot: per-chat [`Session`]s with their [`CommandState`], the
//! [`SessionContext`] handed to handlers, and the [`Router`] that resolves sessions and routes
//! each update. [`Router`] implements [`dbot_dispatch::UpdateProcessor`] so it plugs straight
//! into the dispatch queue.

pub mod command;
pub mod context;
pub mod handlers;
pub mod router;
pub mod session;

pub use command::{CmdResult, CommandState};
pub use context::SessionContext;
pub use handlers::{BotDelegate, CommandHandler, NoopDelegate, QueryHandler, TextHandler};
pub use router::{
    Router, RouterConfig, Services, CMD_BOT_RELOAD, CMD_BOT_STAT, CMD_START, GROUP_ANONYMOUS_BOT,
};
pub use session::{Session, SessionRegistry, SharedSession};
