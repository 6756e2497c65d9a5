//! Preference stores: a JSON document on disk, or a fixed in-memory document.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use crate::error::StorageError;
use crate::models::Preference;
use crate::repository::PreferenceStore;

/// Reads the preference document from a JSON file on every load, so edits on disk are
/// picked up by a reload.
pub struct JsonFilePreferenceStore {
    path: PathBuf,
}

impl JsonFilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PreferenceStore for JsonFilePreferenceStore {
    async fn load_preference(&self) -> Result<Preference, StorageError> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let mut preference: Preference = serde_json::from_str(&raw)?;
        preference.decode_texts();
        info!(
            path = %self.path.display(),
            admins = preference.admins.len(),
            prompts = preference.texts.prompts.len(),
            "Preference loaded"
        );
        Ok(preference)
    }
}

/// Serves a document held in memory; `set` swaps it for the next load.
#[derive(Default)]
pub struct StaticPreferenceStore {
    preference: RwLock<Preference>,
}

impl StaticPreferenceStore {
    pub fn new(preference: Preference) -> Self {
        Self {
            preference: RwLock::new(preference),
        }
    }

    pub async fn set(&self, preference: Preference) {
        *self.preference.write().await = preference;
    }
}

#[async_trait]
impl PreferenceStore for StaticPreferenceStore {
    async fn load_preference(&self) -> Result<Preference, StorageError> {
        let mut preference = self.preference.read().await.clone();
        preference.decode_texts();
        Ok(preference)
    }
}
