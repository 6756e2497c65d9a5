//! dbot CLI: runs the demo bot. Config from env (and `.env`) and optional CLI args.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use dbot_cli::{demo, load_config, Cli, Commands};
use dbot_telegram::run_bot;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { token } => {
            let config = load_config(token)?;
            run_bot(config, Arc::new(demo::DemoDelegate), demo::register).await
        }
    }
}
