//! Integration tests for the runner's build phase (no network).
//!
//! Uses temp dirs for the SQLite user store and the preference document; checks that
//! components come up wired together and that startup loading reads both stores.

use std::sync::Arc;

use dbot_core::SendPort;
use dbot_router::NoopDelegate;
use dbot_telegram::{build_bot, build_teloxide_bot, BotConfig};
use storage::{SqliteUserStore, UserRecord, UserStore};
use tempfile::TempDir;

fn test_config(temp_dir: &TempDir) -> BotConfig {
    let mut config = BotConfig::with_token("123456:TEST");
    config.database_url = temp_dir.path().join("dbot.db").display().to_string();
    config.preference_path = temp_dir.path().join("preference.json").display().to_string();
    config.log_file = temp_dir.path().join("logs/dbot.log").display().to_string();
    config.dispatch_workers = 2;
    config
}

/// **Test: build_bot opens the stores and start() loads existing users and the preference.**
///
/// **Setup:** SQLite file with two users; preference JSON with an admin and an encoded prompt.
/// **Action:** `build_bot`, then `router.start()`.
/// **Expected:** Two sessions, decoded prompt, queue sized from config.
#[tokio::test]
async fn test_build_bot_loads_existing_state() {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(&temp_dir);

    {
        let users = SqliteUserStore::new(&config.database_url).await.unwrap();
        users
            .upsert_user(&UserRecord::new(1, serde_json::json!({"lang": "en"})))
            .await
            .unwrap();
        users
            .upsert_user(&UserRecord::new(2, serde_json::Value::Null))
            .await
            .unwrap();
        users.close().await;
    }
    std::fs::write(
        &config.preference_path,
        r#"{"admins": {"1": "owner"}, "texts": {"prompts": {"start": "SGVsbG8gdGhlcmU="}}}"#,
    )
    .unwrap();

    let components = build_bot(&config, Arc::new(NoopDelegate)).await.unwrap();
    assert_eq!(components.queue.worker_count(), 2);

    assert_eq!(components.router.start().await.unwrap(), 2);
    assert_eq!(components.router.session_count().await, 2);
    let preference = components.router.preference();
    assert!(preference.is_admin(1));
    assert_eq!(preference.prompt("start"), Some("Hello there"));

    components.queue.start();
    components.queue.stop().await;
}

/// **Test: A missing preference file does not prevent startup.**
#[tokio::test]
async fn test_start_without_preference_file() {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(&temp_dir);

    let components = build_bot(&config, Arc::new(NoopDelegate)).await.unwrap();
    assert_eq!(components.router.start().await.unwrap(), 0);
    assert!(components.router.preference().admins.is_empty());
}

/// **Test: The adapter is usable as a SendPort trait object.**
#[test]
fn test_adapter_is_send_port() {
    let bot = build_teloxide_bot(&BotConfig::with_token("123456:TEST"));
    let _port: Arc<dyn SendPort> = Arc::new(dbot_telegram::TelegramBotAdapter::new(bot));
}
