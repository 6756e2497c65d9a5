//! # dbot-cli
//!
//! CLI foundation of the `dbot` binary: argument parsing, config loading, and the demo
//! handlers it registers.

pub mod cli;
pub mod demo;

pub use cli::{load_config, Cli, Commands};
pub use dbot_telegram::BotConfig;
