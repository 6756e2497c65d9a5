//! # dbot-telegram
//!
//! Telegram transport layer: adapters from teloxide updates to [`dbot_core::Update`], the
//! [`dbot_core::SendPort`] implementation, environment config, and the runner that connects
//! teloxide's dispatcher to the dispatch queue and router. No routing logic lives here.

mod adapters;
mod bot_adapter;
mod config;
mod runner;

pub use adapters::{
    to_core_update, TelegramCallbackWrapper, TelegramChatWrapper, TelegramMessageWrapper,
    TelegramUserWrapper,
};
pub use bot_adapter::{classify_error_text, classify_request_error, to_markup, TelegramBotAdapter};
pub use config::BotConfig;
pub use runner::{build_bot, build_teloxide_bot, run_bot, BotComponents};
