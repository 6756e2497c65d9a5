//! SQLite connection pool shared by the SQLite-backed stores.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

const MAX_CONNECTIONS: u32 = 4;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Owns one pool over a database file, created when missing. Workers write user records
/// concurrently, so the file runs in WAL mode with a busy timeout.
#[derive(Clone)]
pub struct SqlitePoolManager {
    pool: SqlitePool,
}

impl SqlitePoolManager {
    /// Accepts a plain file path or a `sqlite:` URL.
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        info!(database_url = %database_url, "Initializing SQLite pool");

        let base = if database_url.starts_with("sqlite:") {
            SqliteConnectOptions::from_str(database_url)?
        } else {
            SqliteConnectOptions::new().filename(database_url)
        };
        let options = base
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Waits for checked-out connections and closes the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
