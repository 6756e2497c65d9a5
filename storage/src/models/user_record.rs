//! User record model for persistence.
//!
//! One record per chat id; maps to the `users` table of SqliteUserStore.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Chat id the record belongs to.
    pub id: i64,
    /// Set when a send to the chat failed as forbidden / chat-not-found; cleared by any inbound update.
    pub blocked: bool,
    /// Application-owned data, opaque to the framework.
    #[serde(rename = "userdata", default)]
    pub user_data: serde_json::Value,
}

impl UserRecord {
    /// Fresh, unblocked record.
    pub fn new(id: i64, user_data: serde_json::Value) -> Self {
        Self {
            id,
            blocked: false,
            user_data,
        }
    }
}
