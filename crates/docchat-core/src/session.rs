//! Conversation session record and the session-state capability.
//!
//! Session state is never ambient: every orchestrator operation receives a
//! [`SessionStore`] scoped to one caller. The hosting framework owns the
//! store's lifecycle (and its idle-timeout expiry); this crate only defines
//! the contract and an in-memory implementation for hosts and tests.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::ids::{FileId, ThreadId, VectorStoreId};

/// Store key under which the [`ConversationSession`] record is persisted.
pub const SESSION_KEY: &str = "conversation";

// ─────────────────────────────────────────────────────────────────────────────
// Session record
// ─────────────────────────────────────────────────────────────────────────────

/// Per-caller record of an in-progress conversation and its remote resources.
///
/// Created implicitly on the first start, mutated by the resource tracker and
/// the orchestrator, cleared by end, expiry, or failure rollback.
///
/// Invariants maintained by the orchestrator:
/// - `is_active == false` ⇒ continuation is rejected
/// - `is_active == true` after a successful start ⇒ `thread_id` is set
/// - `is_active == false` ⇒ `file_ids` and `vector_store_ids` are empty
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSession {
    /// Remote thread handle for the active dialogue, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<ThreadId>,
    /// Whether a conversation is currently in progress.
    #[serde(default)]
    pub is_active: bool,
    /// Remote handles of documents uploaded during this conversation,
    /// in upload-completion order. Duplicates are tolerated.
    #[serde(default)]
    pub file_ids: Vec<FileId>,
    /// Remote handles of search indices built during this conversation.
    #[serde(default)]
    pub vector_store_ids: Vec<VectorStoreId>,
}

impl ConversationSession {
    /// Clear every field, returning the record to the idle state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session store capability
// ─────────────────────────────────────────────────────────────────────────────

/// Per-caller key/value state surviving across requests until host expiry.
///
/// Implementations are scoped to exactly one caller identity; the orchestrator
/// uses [`SessionStore::scope`] only to key its per-session turn guard.
pub trait SessionStore: Send + Sync {
    /// The caller identity this store is scoped to.
    fn scope(&self) -> &str;

    /// Fetch the raw value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<serde_json::Value>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: serde_json::Value);
}

/// Typed accessors over any [`SessionStore`].
pub trait SessionStoreExt: SessionStore {
    /// Fetch and decode the value under `key`.
    ///
    /// Returns `None` when the key is absent or the stored value no longer
    /// decodes as `T` (logged — stale shapes are treated as absent).
    fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key)?;
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(key, error = %e, "stored session value failed to decode; treating as absent");
                None
            }
        }
    }

    /// Encode and store `value` under `key`.
    fn set_as<T: Serialize>(&self, key: &str, value: &T) {
        match serde_json::to_value(value) {
            Ok(v) => self.set(key, v),
            Err(e) => warn!(key, error = %e, "session value failed to encode; not stored"),
        }
    }

    /// Load the conversation record, defaulting to an idle session.
    fn load_session(&self) -> ConversationSession {
        self.get_as(SESSION_KEY).unwrap_or_default()
    }

    /// Persist the conversation record.
    fn save_session(&self, session: &ConversationSession) {
        self.set_as(SESSION_KEY, session);
    }
}

impl<S: SessionStore + ?Sized> SessionStoreExt for S {}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory implementation
// ─────────────────────────────────────────────────────────────────────────────

/// Mutex-guarded in-memory [`SessionStore`] for hosts and tests.
#[derive(Debug)]
pub struct InMemorySessionStore {
    scope: String,
    values: Mutex<HashMap<String, serde_json::Value>>,
}

impl InMemorySessionStore {
    /// Create a store for a fresh caller identity.
    #[must_use]
    pub fn new() -> Self {
        Self::scoped(uuid::Uuid::now_v7().to_string())
    }

    /// Create a store for a known caller identity.
    #[must_use]
    pub fn scoped(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            values: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for InMemorySessionStore {
    fn scope(&self) -> &str {
        &self.scope
    }

    fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.values.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: serde_json::Value) {
        let _ = self.values.lock().insert(key.to_string(), value);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
