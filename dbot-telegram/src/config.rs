//! Bot configuration loaded from environment variables.
//!
//! `BOT_TOKEN` is required unless a token is passed explicitly; everything else has a default.
//! `TELEGRAM_API_URL` (or `TELOXIDE_API_URL`) points the bot at another Bot API server, e.g. a
//! mock server in tests.

use anyhow::{bail, Context, Result};
use dbot_dispatch::DispatchQueueConfig;
use dbot_router::RouterConfig;
use std::env;

pub const DEFAULT_LOG_FILE: &str = "logs/dbot.log";
pub const DEFAULT_DATABASE_URL: &str = "./dbot.db";
pub const DEFAULT_PREFERENCE_PATH: &str = "./preference.json";

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub bot_token: String,
    pub telegram_api_url: Option<String>,
    pub log_file: String,
    /// SQLite file of the user store.
    pub database_url: String,
    /// JSON preference document, re-read by `/botreload`.
    pub preference_path: String,
    pub dispatch_workers: usize,
    pub dispatch_queue_size: usize,
    pub max_pending_queries_per_session: usize,
}

impl BotConfig {
    /// Loads from the environment. `token` overrides `BOT_TOKEN`.
    pub fn load(token: Option<String>) -> Result<Self> {
        let bot_token = match token {
            Some(token) => token,
            None => env::var("BOT_TOKEN").context("BOT_TOKEN not set")?,
        };
        let telegram_api_url = env::var("TELEGRAM_API_URL")
            .or_else(|_| env::var("TELOXIDE_API_URL"))
            .ok();
        let log_file = env::var("LOG_FILE").unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string());
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
        let preference_path =
            env::var("PREFERENCE_PATH").unwrap_or_else(|_| DEFAULT_PREFERENCE_PATH.to_string());

        let dispatch = DispatchQueueConfig::default();
        let dispatch_workers = parse_var("DISPATCH_WORKERS", dispatch.workers)?;
        let dispatch_queue_size = parse_var("DISPATCH_QUEUE_SIZE", dispatch.queue_size)?;
        let max_pending_queries_per_session = parse_var(
            "MAX_PENDING_QUERIES_PER_SESSION",
            RouterConfig::default().max_pending_per_session,
        )?;

        let config = Self {
            bot_token,
            telegram_api_url,
            log_file,
            database_url,
            preference_path,
            dispatch_workers,
            dispatch_queue_size,
            max_pending_queries_per_session,
        };
        config.validate()?;
        Ok(config)
    }

    /// Config with `bot_token` and every other field at its default.
    pub fn with_token(bot_token: impl Into<String>) -> Self {
        let dispatch = DispatchQueueConfig::default();
        Self {
            bot_token: bot_token.into(),
            telegram_api_url: None,
            log_file: DEFAULT_LOG_FILE.to_string(),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            preference_path: DEFAULT_PREFERENCE_PATH.to_string(),
            dispatch_workers: dispatch.workers,
            dispatch_queue_size: dispatch.queue_size,
            max_pending_queries_per_session: RouterConfig::default().max_pending_per_session,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.bot_token.trim().is_empty() {
            bail!("BOT_TOKEN is empty");
        }
        if let Some(url) = &self.telegram_api_url {
            reqwest::Url::parse(url)
                .with_context(|| format!("Invalid TELEGRAM_API_URL: {}", url))?;
        }
        if self.dispatch_workers == 0 {
            bail!("DISPATCH_WORKERS must be at least 1");
        }
        if self.dispatch_queue_size < self.dispatch_workers {
            bail!(
                "DISPATCH_QUEUE_SIZE ({}) must be at least DISPATCH_WORKERS ({})",
                self.dispatch_queue_size,
                self.dispatch_workers
            );
        }
        Ok(())
    }

    pub fn dispatch(&self) -> DispatchQueueConfig {
        DispatchQueueConfig {
            workers: self.dispatch_workers,
            queue_size: self.dispatch_queue_size,
        }
    }

    pub fn router(&self) -> RouterConfig {
        RouterConfig {
            max_pending_per_session: self.max_pending_queries_per_session,
        }
    }
}

fn parse_var(name: &str, default: usize) -> Result<usize> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a non-negative integer, got {:?}", name, raw)),
        Err(_) => Ok(default),
    }
}
