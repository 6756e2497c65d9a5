//! Storage crate: user records, the preference document, and their store abstractions.
//!
//! ## Modules
//!
//! - [`error`] – Storage error types
//! - [`models`] – UserRecord, Preference, Texts
//! - [`repository`] – UserStore and PreferenceStore traits
//! - [`user_repo`] – SqliteUserStore (SQLite)
//! - [`memory_repo`] – InMemoryUserStore
//! - [`preference_store`] – JsonFilePreferenceStore, StaticPreferenceStore
//! - [`sqlite_pool`] – SqlitePoolManager

mod error;
mod memory_repo;
mod models;
mod preference_store;
mod repository;
mod sqlite_pool;
mod user_repo;

pub use error::StorageError;
pub use memory_repo::InMemoryUserStore;
pub use models::{Preference, Texts, UserRecord};
pub use preference_store::{JsonFilePreferenceStore, StaticPreferenceStore};
pub use repository::{PreferenceStore, UserStore};
pub use sqlite_pool::SqlitePoolManager;
pub use user_repo::SqliteUserStore;
