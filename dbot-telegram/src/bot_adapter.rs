//! Wraps teloxide::Bot and implements [`dbot_core::SendPort`]. Production code sends via
//! Telegram; tests substitute another SendPort impl.
//!
//! Telegram errors are classified by teloxide's typed [`ApiError`] first; descriptions it does
//! not type are matched by text: "chat not found" / "not a member" become
//! [`DbotError::ChatNotFound`], other "Forbidden" replies become [`DbotError::Forbidden`],
//! everything else [`DbotError::Bot`].

use async_trait::async_trait;
use dbot_core::{
    DbotError, InlineKeyboard, MediaFile, MessageOptions, ParseMode, Result, SendPort, VideoMeta,
};
use teloxide::prelude::*;
use teloxide::types::{
    CallbackQueryId, ChatId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, MessageId,
    ReplyParameters,
};
use teloxide::{ApiError, RequestError};
use tracing::{debug, warn};

/// Thin wrapper around teloxide::Bot that implements dbot-core's SendPort trait.
#[derive(Clone)]
pub struct TelegramBotAdapter {
    bot: teloxide::Bot,
}

impl TelegramBotAdapter {
    /// Creates an adapter from an existing teloxide Bot.
    pub fn new(bot: teloxide::Bot) -> Self {
        Self { bot }
    }

    /// Returns the underlying teloxide::Bot for direct API use when needed.
    pub fn inner(&self) -> &teloxide::Bot {
        &self.bot
    }
}

/// Maps a Telegram error description to the core error classes.
pub fn classify_error_text(text: &str) -> DbotError {
    let lower = text.to_lowercase();
    if lower.contains("chat not found") || lower.contains("bot is not a member") {
        DbotError::ChatNotFound(text.to_string())
    } else if lower.contains("forbidden")
        || lower.contains("blocked by the user")
        || lower.contains("bot was kicked")
        || lower.contains("user is deactivated")
    {
        DbotError::Forbidden(text.to_string())
    } else {
        DbotError::Bot(text.to_string())
    }
}

/// Maps a teloxide error by its typed API variant, falling back to the description for
/// variants teloxide reports as `Unknown` and for non-API failures.
pub fn classify_request_error(e: &RequestError) -> DbotError {
    let text = e.to_string();
    match e {
        RequestError::Api(
            ApiError::BotBlocked
            | ApiError::BotKicked
            | ApiError::BotKickedFromSupergroup
            | ApiError::UserDeactivated
            | ApiError::CantInitiateConversation
            | ApiError::CantTalkWithBots,
        ) => DbotError::Forbidden(text),
        RequestError::Api(ApiError::ChatNotFound) => DbotError::ChatNotFound(text),
        _ => classify_error_text(&text),
    }
}

fn map_err(e: RequestError) -> DbotError {
    classify_request_error(&e)
}

fn file(media: MediaFile) -> InputFile {
    InputFile::memory(media.data).file_name(media.name)
}

#[allow(deprecated)]
fn parse_mode(mode: ParseMode) -> Option<teloxide::types::ParseMode> {
    match mode {
        ParseMode::Plain => None,
        ParseMode::Html => Some(teloxide::types::ParseMode::Html),
        ParseMode::Markdown => Some(teloxide::types::ParseMode::Markdown),
    }
}

/// Converts a core keyboard. Buttons with an unparsable URL, or with neither URL nor
/// callback data, are skipped.
pub fn to_markup(keyboard: &InlineKeyboard) -> InlineKeyboardMarkup {
    let rows = keyboard.rows.iter().map(|row| {
        row.iter()
            .filter_map(|button| {
                if let Some(url) = &button.url {
                    match reqwest::Url::parse(url) {
                        Ok(url) => return Some(InlineKeyboardButton::url(button.text.clone(), url)),
                        Err(e) => {
                            warn!(url = %url, error = %e, "Skipping keyboard button with invalid URL");
                            return None;
                        }
                    }
                }
                button
                    .callback_data
                    .as_ref()
                    .map(|data| InlineKeyboardButton::callback(button.text.clone(), data.clone()))
            })
            .collect::<Vec<_>>()
    });
    InlineKeyboardMarkup::new(rows)
}

#[async_trait]
impl SendPort for TelegramBotAdapter {
    async fn send_text(&self, chat_id: i64, text: &str, options: &MessageOptions) -> Result<()> {
        let mut request = self.bot.send_message(ChatId(chat_id), text.to_string());
        if let Some(id) = options.reply_to {
            request = request.reply_parameters(ReplyParameters::new(MessageId(id)));
        }
        if let Some(mode) = parse_mode(options.parse_mode) {
            request = request.parse_mode(mode);
        }
        if let Some(keyboard) = &options.reply_markup {
            request = request.reply_markup(to_markup(keyboard));
        }
        request.await.map_err(map_err)?;
        debug!(chat_id, "Text sent");
        Ok(())
    }

    async fn send_photo(&self, chat_id: i64, photo: MediaFile) -> Result<()> {
        self.bot
            .send_photo(ChatId(chat_id), file(photo))
            .await
            .map_err(map_err)?;
        Ok(())
    }

    async fn send_video(&self, chat_id: i64, video: MediaFile, meta: Option<VideoMeta>) -> Result<()> {
        let mut request = self.bot.send_video(ChatId(chat_id), file(video));
        if let Some(meta) = meta {
            if meta.duration > 0 {
                request = request.duration(meta.duration);
            }
            if meta.width > 0 {
                request = request.width(meta.width);
            }
            if meta.height > 0 {
                request = request.height(meta.height);
            }
        }
        request.await.map_err(map_err)?;
        Ok(())
    }

    async fn send_audio(&self, chat_id: i64, audio: MediaFile) -> Result<()> {
        self.bot
            .send_audio(ChatId(chat_id), file(audio))
            .await
            .map_err(map_err)?;
        Ok(())
    }

    async fn send_document(&self, chat_id: i64, document: MediaFile) -> Result<()> {
        self.bot
            .send_document(ChatId(chat_id), file(document))
            .await
            .map_err(map_err)?;
        Ok(())
    }

    async fn answer_callback(&self, callback_query_id: &str) -> Result<()> {
        self.bot
            .answer_callback_query(CallbackQueryId(callback_query_id.to_string()))
            .await
            .map_err(map_err)?;
        Ok(())
    }

    async fn chat_administrator_ids(&self, chat_id: i64) -> Result<Vec<i64>> {
        let admins = self
            .bot
            .get_chat_administrators(ChatId(chat_id))
            .await
            .map_err(map_err)?;
        Ok(admins.iter().map(|m| m.user.id.0 as i64).collect())
    }
}
