//! Pending inline-option queries awaiting a single callback.
//!
//! Each session owns a bounded [`LruMap`] of its outstanding queries; a reverse index maps
//! query id → owning session. Both indices sit behind one mutex and are always mutated
//! together: an id is in the reverse index iff it is in exactly one session registry.
//!
//! Callback data for option `key` of query `id` is `q:<id>:<key>`.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError};

use dbot_core::{InlineButton, InlineKeyboard};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::lru_map::LruMap;

const CALLBACK_PREFIX: &str = "q";

/// An outstanding option set. Holds only serializable data: the continuation is the name of
/// a handler registered with the router, not a closure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingQuery {
    pub id: String,
    pub session_id: i64,
    /// Positional option key (`"0"`, `"1"`, ...) → option label.
    pub answers: BTreeMap<String, String>,
    pub continuation: String,
}

impl PendingQuery {
    pub fn answer(&self, key: &str) -> Option<&str> {
        self.answers.get(key).map(String::as_str)
    }
}

/// Parsed `q:<id>:<key>` callback data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallbackToken<'a> {
    pub query_id: &'a str,
    pub key: &'a str,
}

impl<'a> CallbackToken<'a> {
    pub fn parse(data: &'a str) -> Option<Self> {
        let mut parts = data.splitn(3, ':');
        if parts.next()? != CALLBACK_PREFIX {
            return None;
        }
        let query_id = parts.next().filter(|s| !s.is_empty())?;
        let key = parts.next().filter(|s| !s.is_empty())?;
        Some(Self { query_id, key })
    }
}

fn callback_data(query_id: &str, key: &str) -> String {
    format!("{}:{}:{}", CALLBACK_PREFIX, query_id, key)
}

struct QueryIndex {
    by_session: HashMap<i64, LruMap<String, PendingQuery>>,
    query_to_session: HashMap<String, i64>,
    seq: u64,
}

pub struct QueryStore {
    max_per_session: usize,
    inner: Mutex<QueryIndex>,
}

impl QueryStore {
    /// `max_per_session` bounds each session's registry; 0 is clamped to 1.
    pub fn new(max_per_session: usize) -> Self {
        Self {
            max_per_session: max_per_session.max(1),
            inner: Mutex::new(QueryIndex {
                by_session: HashMap::new(),
                query_to_session: HashMap::new(),
                seq: 0,
            }),
        }
    }

    pub fn max_per_session(&self) -> usize {
        self.max_per_session
    }

    /// Registers a new query for `session_id` and returns its keyboard (one option per row).
    ///
    /// Returns `None` without registering anything when `options` is empty or
    /// `continuation` is empty. When the session is at capacity its least recently used
    /// query is evicted from both indices.
    pub fn create<S: AsRef<str>>(
        &self,
        session_id: i64,
        options: &[S],
        continuation: &str,
    ) -> Option<InlineKeyboard> {
        if options.is_empty() || continuation.is_empty() {
            return None;
        }

        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.seq += 1;
        let query_id = inner.seq.to_string();

        let mut answers = BTreeMap::new();
        let mut rows = Vec::with_capacity(options.len());
        for (idx, option) in options.iter().enumerate() {
            let key = idx.to_string();
            let label = option.as_ref().to_string();
            rows.push(vec![InlineButton::callback(
                label.clone(),
                callback_data(&query_id, &key),
            )]);
            answers.insert(key, label);
        }

        let item = PendingQuery {
            id: query_id.clone(),
            session_id,
            answers,
            continuation: continuation.to_string(),
        };

        let max_per_session = self.max_per_session;
        let evicted = inner
            .by_session
            .entry(session_id)
            .or_insert_with(|| LruMap::new(max_per_session))
            .put(query_id.clone(), item);
        inner.query_to_session.insert(query_id.clone(), session_id);
        if let Some((evicted_id, _)) = evicted {
            inner.query_to_session.remove(&evicted_id);
            debug!(
                session_id,
                query_id = %evicted_id,
                "Evicted pending query over per-session capacity"
            );
        }
        debug!(session_id, query_id = %query_id, options = options.len(), "Pending query created");

        Some(InlineKeyboard { rows })
    }

    /// Removes and returns the query with `query_id`. A second take of the same id, or a
    /// take of an evicted / unknown id, returns `None`.
    pub fn take(&self, query_id: &str) -> Option<PendingQuery> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);

        let session_id = inner.query_to_session.remove(query_id)?;
        let registry = inner.by_session.get_mut(&session_id)?;
        let item = registry.take(&query_id.to_string());
        if registry.is_empty() {
            inner.by_session.remove(&session_id);
        }
        item
    }

    /// Total outstanding queries.
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .query_to_session
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Outstanding queries of one session.
    pub fn session_len(&self, session_id: i64) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .by_session
            .get(&session_id)
            .map_or(0, LruMap::len)
    }

    /// Number of sessions holding a registry.
    pub fn session_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .by_session
            .len()
    }
}
