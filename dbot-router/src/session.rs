//! Per-chat session and the registry holding every known session.

use std::collections::HashMap;
use std::sync::Arc;

use storage::UserRecord;
use tokio::sync::{Mutex, RwLock};

use crate::command::CommandState;

/// Conversation context of one chat: its persisted user record and command state.
#[derive(Debug)]
pub struct Session {
    pub id: i64,
    pub user: UserRecord,
    pub command: CommandState,
}

impl Session {
    pub fn new(user: UserRecord) -> Self {
        Self {
            id: user.id,
            user,
            command: CommandState::new(),
        }
    }
}

/// A session shared between the registry and the worker currently processing its chat.
pub type SharedSession = Arc<Mutex<Session>>;

/// Chat id → session. Lookups take the read lock; inserts take the write lock.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<i64, SharedSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, id: i64) -> Option<SharedSession> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Registers `session` unless its id is already present; returns the registered one.
    pub async fn insert(&self, session: Session) -> SharedSession {
        self.sessions
            .write()
            .await
            .entry(session.id)
            .or_insert_with(|| Arc::new(Mutex::new(session)))
            .clone()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
