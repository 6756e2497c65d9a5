//! # dbot-dispatch
//!
//! Coordination primitives of the update pipeline:
//!
//! - [`LruMap`] – bounded map with least-recently-used eviction that reports what it evicts
//! - [`QueryStore`] – per-session registries of pending inline-option queries plus the
//!   id → session reverse index
//! - [`DispatchQueue`] – bounded, chat-sharded queue drained by a fixed worker pool that hands
//!   each update to an [`UpdateProcessor`]

pub mod lru_map;
pub mod pending;
pub mod queue;

pub use lru_map::LruMap;
pub use pending::{CallbackToken, PendingQuery, QueryStore};
pub use queue::{DispatchQueue, DispatchQueueConfig, UpdateProcessor};
