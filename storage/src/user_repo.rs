//! User repository: SQLite persistence for [`UserRecord`]s.
//!
//! Uses SqlitePoolManager; `user_data` is stored as JSON text.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use tracing::{debug, info};

use crate::error::StorageError;
use crate::models::UserRecord;
use crate::repository::UserStore;
use crate::sqlite_pool::SqlitePoolManager;

#[derive(Clone)]
pub struct SqliteUserStore {
    pool_manager: SqlitePoolManager,
}

impl SqliteUserStore {
    pub async fn new(database_url: &str) -> Result<Self, StorageError> {
        let pool_manager = SqlitePoolManager::new(database_url).await?;
        let repo = Self { pool_manager };
        repo.init().await?;
        Ok(repo)
    }

    async fn init(&self) -> Result<(), sqlx::Error> {
        info!("Creating users table if not exist");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY,
                blocked INTEGER NOT NULL DEFAULT 0,
                user_data TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(self.pool_manager.pool())
        .await?;

        Ok(())
    }

    pub async fn get_user(&self, id: i64) -> Result<Option<UserRecord>, StorageError> {
        let row = sqlx::query("SELECT id, blocked, user_data FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool_manager.pool())
            .await?;
        row.map(|r| row_to_record(&r)).transpose()
    }

    pub async fn close(&self) {
        self.pool_manager.close().await;
    }
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<UserRecord, StorageError> {
    let user_data: String = row.try_get("user_data")?;
    Ok(UserRecord {
        id: row.try_get("id")?,
        blocked: row.try_get("blocked")?,
        user_data: serde_json::from_str(&user_data)?,
    })
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn get_all_users(&self) -> Result<Vec<UserRecord>, StorageError> {
        let rows = sqlx::query("SELECT id, blocked, user_data FROM users ORDER BY id")
            .fetch_all(self.pool_manager.pool())
            .await?;
        let users = rows
            .iter()
            .map(row_to_record)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = users.len(), "Loaded users");
        Ok(users)
    }

    async fn upsert_user(&self, user: &UserRecord) -> Result<(), StorageError> {
        let user_data = serde_json::to_string(&user.user_data)?;
        sqlx::query(
            r#"
            INSERT INTO users (id, blocked, user_data, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                blocked = excluded.blocked,
                user_data = excluded.user_data,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user.id)
        .bind(user.blocked)
        .bind(user_data)
        .bind(Utc::now().to_rfc3339())
        .execute(self.pool_manager.pool())
        .await?;
        debug!(user_id = user.id, blocked = user.blocked, "User upserted");
        Ok(())
    }
}
