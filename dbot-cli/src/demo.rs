//! Demo handlers registered by `dbot run`.
//!
//! - `/order` walks through two prompts (item, then quantity) keeping typed arguments in the
//!   command state;
//! - `/color` sends an option picker whose answer is stored in the user's data;
//! - plain text outside a command is echoed back.

use std::sync::Arc;

use async_trait::async_trait;
use dbot_core::{CallbackQuery, HandlerError, Message, Result};
use dbot_router::{
    BotDelegate, CmdResult, CommandHandler, QueryHandler, Router, Session, SessionContext,
    TextHandler,
};
use serde_json::json;
use storage::Preference;
use tracing::{debug, info};

pub const CMD_ORDER: &str = "order";
pub const CMD_COLOR: &str = "color";
pub const QUERY_COLOR: &str = "color";

pub const COLORS: [&str; 3] = ["Red", "Green", "Blue"];

const STAGE_ITEM: &str = "item";
const STAGE_QUANTITY: &str = "quantity";

/// Registers every demo handler on `router`.
pub fn register(router: &Router) {
    router.register_command(CMD_ORDER, Arc::new(OrderCommand));
    router.register_command(CMD_COLOR, Arc::new(ColorCommand));
    router.register_query_handler(QUERY_COLOR, Arc::new(ColorAnswer));
    router.register_text_handler(Arc::new(EchoText));
}

#[derive(Debug, Default)]
struct OrderArgs {
    item: String,
}

/// `/order [item]`: asks for the item unless given inline, then for a quantity.
pub struct OrderCommand;

#[async_trait]
impl CommandHandler for OrderCommand {
    async fn handle(
        &self,
        ctx: &mut SessionContext<'_>,
        args: &str,
        _message: &Message,
    ) -> Result<CmdResult> {
        let input = args.trim();

        if ctx.command().stage() == STAGE_QUANTITY {
            let Ok(quantity) = input.parse::<u32>() else {
                ctx.send_text("Please send a number.").await?;
                return Ok(CmdResult::WaitingForInput);
            };
            let Some(item) = ctx.command().args::<OrderArgs>().map(|a| a.item.clone()) else {
                return Err(HandlerError::State("order has no item".into()).into());
            };
            info!(chat_id = ctx.id(), item = %item, quantity, "Order placed");
            ctx.send_text(&format!("Ordered {} x {}.", quantity, item)).await?;
            return Ok(CmdResult::Processed);
        }

        if input.is_empty() {
            ctx.command_mut().set_stage(STAGE_ITEM);
            ctx.send_text("What would you like to order?").await?;
            return Ok(CmdResult::WaitingForInput);
        }

        ctx.command_mut().args_mut::<OrderArgs>().item = input.to_string();
        ctx.command_mut().set_stage(STAGE_QUANTITY);
        ctx.send_text("How many?").await?;
        Ok(CmdResult::WaitingForInput)
    }
}

/// `/color`: offers [`COLORS`]; the pick is handled by [`ColorAnswer`].
pub struct ColorCommand;

#[async_trait]
impl CommandHandler for ColorCommand {
    async fn handle(
        &self,
        ctx: &mut SessionContext<'_>,
        _args: &str,
        _message: &Message,
    ) -> Result<CmdResult> {
        ctx.send_query("Pick a color", &COLORS, QUERY_COLOR).await?;
        Ok(CmdResult::Processed)
    }
}

pub struct ColorAnswer;

#[async_trait]
impl QueryHandler for ColorAnswer {
    async fn handle(
        &self,
        ctx: &mut SessionContext<'_>,
        answer: &str,
        _query: &CallbackQuery,
    ) -> Result<()> {
        let data = &mut ctx.user_mut().user_data;
        if !data.is_object() {
            *data = json!({});
        }
        data["color"] = json!(answer);
        ctx.save_user().await?;
        ctx.send_text(&format!("You picked {}.", answer)).await
    }
}

pub struct EchoText;

#[async_trait]
impl TextHandler for EchoText {
    async fn handle(&self, ctx: &mut SessionContext<'_>, text: &str, message: &Message) -> Result<()> {
        ctx.reply_text(text, message.id).await
    }
}

/// Seeds new users with an empty profile and logs loading progress.
pub struct DemoDelegate;

impl BotDelegate for DemoDelegate {
    fn new_user_data(&self) -> serde_json::Value {
        json!({ "color": null })
    }

    fn did_load_user(&self, session: &Session) {
        debug!(chat_id = session.id, blocked = session.user.blocked, "User loaded");
    }

    fn did_load_preference(&self, preference: &Preference) {
        info!(
            admins = preference.admins.len(),
            prompts = preference.texts.prompts.len(),
            "Preference loaded"
        );
    }
}
