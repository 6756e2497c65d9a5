use async_trait::async_trait;

use crate::error::StorageError;
use crate::models::{Preference, UserRecord};

/// Persistence for user records, keyed by chat id.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_all_users(&self) -> Result<Vec<UserRecord>, StorageError>;
    /// Inserts the record or replaces the stored one with the same id.
    async fn upsert_user(&self, user: &UserRecord) -> Result<(), StorageError>;
}

/// Source of the reloadable preference document.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Loads the document. Implementations return texts already base64-decoded
    /// (see [`Preference::decode_texts`]).
    async fn load_preference(&self) -> Result<Preference, StorageError>;
}
