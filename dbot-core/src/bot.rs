//! Send port: the outbound half of the transport.
//!
//! [`SendPort`] is transport-agnostic; `dbot-telegram` implements it via teloxide and tests
//! substitute a recording mock. Implementations classify failures into
//! [`DbotError::Forbidden`](crate::DbotError::Forbidden) / [`DbotError::ChatNotFound`](crate::DbotError::ChatNotFound)
//! so the session layer can mark unreachable users as blocked.

use crate::error::Result;
use crate::types::{MediaFile, MessageOptions, VideoMeta};
use async_trait::async_trait;

/// Abstraction for sending to a chat. Every call names its destination chat id.
#[async_trait]
pub trait SendPort: Send + Sync {
    /// Sends a text message. `options.prompt_key` is already resolved by the caller.
    async fn send_text(&self, chat_id: i64, text: &str, options: &MessageOptions) -> Result<()>;
    async fn send_photo(&self, chat_id: i64, photo: MediaFile) -> Result<()>;
    async fn send_video(&self, chat_id: i64, video: MediaFile, meta: Option<VideoMeta>) -> Result<()>;
    async fn send_audio(&self, chat_id: i64, audio: MediaFile) -> Result<()>;
    async fn send_document(&self, chat_id: i64, document: MediaFile) -> Result<()>;
    /// Acknowledges a callback query so the client stops its loading indicator.
    async fn answer_callback(&self, callback_query_id: &str) -> Result<()>;
    /// User ids of the chat's administrators (used for group admin gating).
    async fn chat_administrator_ids(&self, chat_id: i64) -> Result<Vec<i64>>;
}
