//! Session-scoped ledger of remote object ids.
//!
//! Every remote object created for a conversation is recorded here so
//! teardown can find it later. Appends do not deduplicate — a double-tracked
//! id is deleted twice during cleanup, which the service tolerates.
//!
//! Access is single-threaded per session: the orchestrator's turn guard
//! rejects concurrent requests for one session, so the read-modify-write
//! against the store never races.

use docchat_core::ids::{FileId, VectorStoreId};
use docchat_core::session::{SessionStore, SessionStoreExt};
use tracing::debug;

/// Records remote resource ids into a session's conversation record.
pub struct ResourceTracker<'a> {
    store: &'a dyn SessionStore,
}

impl<'a> ResourceTracker<'a> {
    /// Track resources through the given session store.
    #[must_use]
    pub fn new(store: &'a dyn SessionStore) -> Self {
        Self { store }
    }

    /// Record an uploaded document handle.
    pub fn track_file(&self, id: FileId) {
        debug!(file_id = %id, "tracking uploaded document");
        let mut session = self.store.load_session();
        session.file_ids.push(id);
        self.store.save_session(&session);
    }

    /// Record a search-index handle.
    pub fn track_vector_store(&self, id: VectorStoreId) {
        debug!(vector_store_id = %id, "tracking vector store");
        let mut session = self.store.load_session();
        session.vector_store_ids.push(id);
        self.store.save_session(&session);
    }
}
