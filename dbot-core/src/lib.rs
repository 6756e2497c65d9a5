//! # dbot-core
//!
//! Core types and traits for the chat-bot backend: the inbound [`Update`] model, the outbound
//! [`SendPort`], the error model, and tracing initialization. Transport-agnostic; used by
//! dbot-dispatch, dbot-router and dbot-telegram.

pub mod bot;
pub mod error;
pub mod logger;
pub mod types;

pub use bot::SendPort;
pub use error::{DbotError, HandlerError, Result};
pub use logger::init_tracing;
pub use types::{
    CallbackQuery, Chat, ChatKind, InlineButton, InlineKeyboard, MediaFile, Message,
    MessageOptions, ParseMode, Update, User, VideoMeta,
};
