//! Bot runner: wires teloxide updates into the dispatch queue, and the queue into the router.
//!
//! teloxide Dispatcher → [`to_core_update`] → [`DispatchQueue::enqueue`] → worker →
//! [`Router`] (implements [`dbot_dispatch::UpdateProcessor`]).

use std::sync::Arc;

use anyhow::{Context, Result};
use dbot_core::init_tracing;
use dbot_dispatch::DispatchQueue;
use dbot_router::{BotDelegate, Router, Services};
use storage::{JsonFilePreferenceStore, SqliteUserStore};
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use tracing::{error, info, instrument};

use crate::adapters::to_core_update;
use crate::bot_adapter::TelegramBotAdapter;
use crate::config::BotConfig;

/// Everything a running bot is made of; built by [`build_bot`].
pub struct BotComponents {
    pub bot: teloxide::Bot,
    pub router: Arc<Router>,
    pub queue: Arc<DispatchQueue>,
}

/// teloxide Bot for `config`, pointed at `telegram_api_url` when set.
pub fn build_teloxide_bot(config: &BotConfig) -> teloxide::Bot {
    let bot = Bot::new(config.bot_token.clone());
    match &config.telegram_api_url {
        Some(url_str) => match reqwest::Url::parse(url_str) {
            Ok(url) => bot.set_api_url(url),
            Err(e) => {
                error!(error = %e, url = %url_str, "Invalid TELEGRAM_API_URL, using default");
                bot
            }
        },
        None => bot,
    }
}

/// Opens the stores and builds the router and dispatch queue without starting anything.
#[instrument(skip(config, delegate))]
pub async fn build_bot(config: &BotConfig, delegate: Arc<dyn BotDelegate>) -> Result<BotComponents> {
    let users = SqliteUserStore::new(&config.database_url)
        .await
        .with_context(|| format!("Failed to open user store at {}", config.database_url))?;
    let preferences = JsonFilePreferenceStore::new(&config.preference_path);
    let bot = build_teloxide_bot(config);

    let router = Arc::new(Router::new(
        Services {
            sender: Arc::new(TelegramBotAdapter::new(bot.clone())),
            users: Arc::new(users),
            preferences: Arc::new(preferences),
            delegate,
        },
        config.router(),
    ));
    let queue = Arc::new(DispatchQueue::new(config.dispatch()));
    queue.set_processor(router.clone());

    info!(
        database_url = %config.database_url,
        preference_path = %config.preference_path,
        workers = queue.worker_count(),
        "step: bot components built"
    );
    Ok(BotComponents { bot, router, queue })
}

/// Every update goes to the dispatch queue; the router does the rest.
fn schema() -> UpdateHandler<teloxide::RequestError> {
    dptree::entry().endpoint(|update: Update, queue: Arc<DispatchQueue>| async move {
        match to_core_update(&update) {
            Some(update) => queue.enqueue(update).await,
            None => tracing::debug!(update_id = update.id.0, "Unhandled update kind"),
        }
        respond(())
    })
}

/// Main entry: init logging, validate config, build components, let `setup` register
/// handlers, load users and preferences, then dispatch until Ctrl-C. The queue is stopped
/// (current items finish) before returning.
#[instrument(skip(config, delegate, setup))]
pub async fn run_bot<F>(config: BotConfig, delegate: Arc<dyn BotDelegate>, setup: F) -> Result<()>
where
    F: FnOnce(&Router),
{
    config.validate()?;
    init_tracing(&config.log_file)?;

    let BotComponents { bot, router, queue } = build_bot(&config, delegate).await?;
    setup(&router);

    let loaded = router.start().await.context("Failed to load users")?;
    queue.start();
    info!(sessions = loaded, "Bot started successfully");

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![queue.clone()])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("step: dispatcher stopped, draining queue");
    queue.stop().await;
    Ok(())
}
