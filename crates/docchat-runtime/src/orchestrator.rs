//! Conversation state machine: start, continue, end.
//!
//! A session is `Idle` or `Active`, persisted in the caller's session store.
//! Exactly one turn runs at a time per session: a second request for the
//! same session scope while one is in flight is rejected with a state error
//! (an RAII guard keyed on the store's scope enforces this).
//!
//! Within a start: document uploads fan out concurrently; the vector store
//! and the thread are created concurrently once uploads settle; the
//! connected-agent attachment runs as a detached background task so the
//! user-visible turn never waits on it. That detachment opens an
//! eventual-consistency window — the first reply can arrive before document
//! search is wired into the primary agent. The window is accepted for
//! latency and closes as soon as the attach task lands.
//!
//! A start that fails after remote objects exist rolls those objects back
//! best-effort and resets local state; the original error still propagates.

use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use docchat_client::types::ToolResources;
use docchat_client::{AgentsClient, ConnectionCache, ConnectionHandle, CredentialStrategy};
use docchat_core::ids::{FileId, ThreadId, VectorStoreId};
use docchat_core::messages::{ChatMessage, MessageRole};
use docchat_core::session::{SessionStore, SessionStoreExt};
use futures::future::join_all;
use metrics::{counter, gauge};
use tracing::{debug, info, instrument, warn};

use crate::cleanup::{self, CleanupReport};
use crate::config::ChatConfig;
use crate::errors::OrchestratorError;
use crate::extract;
use crate::poller::{self, PollProfile};
use crate::tracker::ResourceTracker;

/// Coordinates conversation lifecycle against the Agent Service.
///
/// One instance serves every session in the process; per-session state lives
/// in the injected [`SessionStore`], and the remote connection is shared
/// through the single-flight [`ConnectionCache`].
#[derive(Debug)]
pub struct ConversationOrchestrator {
    config: ChatConfig,
    connections: ConnectionCache,
    /// Session scopes with a turn currently in flight.
    active_turns: Arc<DashMap<String, ()>>,
}

impl ConversationOrchestrator {
    /// Build an orchestrator from configuration.
    ///
    /// Fails when no credential strategy can be selected for the configured
    /// deployment (e.g. local deployment without an API key).
    pub fn new(config: ChatConfig) -> Result<Self, OrchestratorError> {
        let credentials =
            CredentialStrategy::select(config.deployment, config.api_key.clone()).map_err(|e| {
                OrchestratorError::Connection {
                    reason: e.to_string(),
                }
            })?;
        let connections = ConnectionCache::new(config.endpoint.clone(), credentials);
        Ok(Self {
            config,
            connections,
            active_turns: Arc::new(DashMap::new()),
        })
    }

    /// Start a new conversation: upload documents, build the search index
    /// and thread, and answer the first message.
    ///
    /// Fails with a state error when a conversation is already active, and
    /// with a validation error when none of the supplied documents could be
    /// uploaded.
    #[instrument(skip_all, fields(scope = store.scope(), documents = document_paths.len()))]
    pub async fn start(
        &self,
        store: &dyn SessionStore,
        document_paths: &[PathBuf],
        message: &str,
    ) -> Result<ChatMessage, OrchestratorError> {
        let _turn = self.begin_turn(store.scope())?;

        let mut session = store.load_session();
        if session.is_active {
            return Err(OrchestratorError::State(
                "a conversation is already active; end it before starting another".to_string(),
            ));
        }

        // Optimistic activation; every failure path below rolls this back.
        session.is_active = true;
        store.save_session(&session);

        let conn = match self.connect().await {
            Ok(conn) => conn,
            Err(e) => {
                Self::reset_local(store);
                return Err(e);
            }
        };

        let thread_id = match self.setup_conversation(&conn, store, document_paths).await {
            Ok(thread_id) => thread_id,
            Err(e) => {
                self.rollback_failed_start(&conn, store).await;
                return Err(e);
            }
        };
        counter!("conversations_started_total").increment(1);

        // From here the conversation stands. A turn failure (timeout, failed
        // run) leaves it active so the caller can retry or end explicitly.
        self.send_and_await(&conn, &thread_id, message, &self.config.poll_start)
            .await
    }

    /// Upload documents and create the index and thread. Returns the new
    /// thread handle.
    async fn setup_conversation(
        &self,
        conn: &ConnectionHandle,
        store: &dyn SessionStore,
        document_paths: &[PathBuf],
    ) -> Result<ThreadId, OrchestratorError> {
        let uploaded = Self::upload_documents(&conn.agents, document_paths).await;
        if uploaded.is_empty() {
            return Err(OrchestratorError::Validation(
                "no documents were successfully uploaded".to_string(),
            ));
        }

        let tracker = ResourceTracker::new(store);
        for id in &uploaded {
            tracker.track_file(id.clone());
        }

        // The index and the thread have no dependency on each other.
        let index_name = format!("docchat-{}", store.scope());
        let (vs_result, thread_result) = tokio::join!(
            conn.agents.create_vector_store(&index_name, &uploaded),
            conn.agents.create_thread(),
        );

        // Record whichever handles exist before inspecting errors, so a
        // partial failure is still visible to the rollback pass.
        if let Ok(vector_store) = &vs_result {
            tracker.track_vector_store(vector_store.id.clone());
        }
        if let Ok(thread) = &thread_result {
            let mut session = store.load_session();
            session.thread_id = Some(thread.id.clone());
            store.save_session(&session);
        }

        let vector_store = vs_result?;
        let thread = thread_result?;
        info!(
            thread_id = %thread.id,
            vector_store_id = %vector_store.id,
            files = uploaded.len(),
            "conversation resources created"
        );

        self.spawn_attach(&conn.agents, vector_store.id);

        Ok(thread.id)
    }

    /// Continue the active conversation with one more message.
    ///
    /// The thread is re-fetched first; if it is gone (host expiry, remote
    /// deletion), the session resets to idle and the turn fails as expired.
    #[instrument(skip_all, fields(scope = store.scope()))]
    pub async fn continue_turn(
        &self,
        store: &dyn SessionStore,
        message: &str,
    ) -> Result<ChatMessage, OrchestratorError> {
        let _turn = self.begin_turn(store.scope())?;

        let mut session = store.load_session();
        if !session.is_active {
            return Err(OrchestratorError::State(
                "no active conversation to continue".to_string(),
            ));
        }
        let Some(thread_id) = session.thread_id.clone() else {
            return Err(OrchestratorError::State(
                "active conversation has no thread".to_string(),
            ));
        };

        let conn = self.connect().await?;

        if let Err(e) = conn.agents.get_thread(&thread_id).await {
            warn!(thread_id = %thread_id, error = %e, "thread fetch failed; resetting session");
            session.reset();
            store.save_session(&session);
            return Err(OrchestratorError::SessionExpired);
        }

        self.send_and_await(&conn, &thread_id, message, &self.config.poll_continue)
            .await
    }

    /// End the conversation and reclaim every tracked remote resource.
    ///
    /// A no-op on an idle session. Per-resource deletion failures are logged
    /// and reported, never fatal; only failing to reach the service at all
    /// propagates.
    #[instrument(skip_all, fields(scope = store.scope()))]
    pub async fn end(&self, store: &dyn SessionStore) -> Result<CleanupReport, OrchestratorError> {
        let _turn = self.begin_turn(store.scope())?;

        let mut session = store.load_session();
        let idle = !session.is_active
            && session.thread_id.is_none()
            && session.file_ids.is_empty()
            && session.vector_store_ids.is_empty();
        if idle {
            debug!("end on idle session; nothing to clean up");
            return Ok(CleanupReport::default());
        }

        let conn = self.connect().await?;
        let report = cleanup::teardown(
            &conn.agents,
            &session,
            self.config.connected_agent_id.as_ref(),
        )
        .await;

        session.reset();
        store.save_session(&session);
        counter!("conversations_ended_total").increment(1);
        info!(failures = report.failures.len(), "conversation ended");
        Ok(report)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Turn plumbing
    // ─────────────────────────────────────────────────────────────────────

    /// Claim the session's turn slot, or reject the request.
    fn begin_turn(&self, scope: &str) -> Result<TurnGuard, OrchestratorError> {
        match self.active_turns.entry(scope.to_string()) {
            Entry::Occupied(_) => Err(OrchestratorError::State(
                "another request for this conversation is still in progress".to_string(),
            )),
            Entry::Vacant(entry) => {
                let _ = entry.insert(());
                gauge!("conversation_turns_inflight").increment(1.0);
                Ok(TurnGuard {
                    turns: Arc::clone(&self.active_turns),
                    scope: scope.to_string(),
                })
            }
        }
    }

    async fn connect(&self) -> Result<Arc<ConnectionHandle>, OrchestratorError> {
        self.connections
            .acquire()
            .await
            .map_err(|e| OrchestratorError::Connection {
                reason: e.to_string(),
            })
    }

    /// Upload every existing path concurrently, keeping the successes.
    async fn upload_documents(agents: &AgentsClient, paths: &[PathBuf]) -> Vec<FileId> {
        let existing: Vec<&PathBuf> = paths.iter().filter(|p| p.exists()).collect();
        if existing.len() < paths.len() {
            warn!(
                missing = paths.len() - existing.len(),
                "some document paths no longer exist; skipping them"
            );
        }

        let results = join_all(existing.iter().map(|p| agents.upload_file(p.as_path()))).await;
        let mut uploaded = Vec::new();
        for (path, result) in existing.iter().zip(results) {
            match result {
                Ok(file) => {
                    debug!(path = %path.display(), file_id = %file.id, "document uploaded");
                    uploaded.push(file.id);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "document upload failed; skipping");
                }
            }
        }
        uploaded
    }

    /// Attach the vector store to the connected agent off the turn's
    /// critical path. Completion is only logged.
    fn spawn_attach(&self, agents: &AgentsClient, vector_store: VectorStoreId) {
        let Some(agent_id) = self.config.connected_agent_id.clone() else {
            return;
        };
        let agents = agents.clone();
        drop(tokio::spawn(async move {
            let resources = ToolResources::with_vector_stores(vec![vector_store.clone()]);
            match agents.update_agent(&agent_id, &resources).await {
                Ok(_) => {
                    info!(agent_id = %agent_id, vector_store_id = %vector_store,
                        "vector store attached to connected agent");
                }
                Err(e) => {
                    warn!(agent_id = %agent_id, vector_store_id = %vector_store, error = %e,
                        "connected-agent attachment failed");
                }
            }
        }));
    }

    /// Post the user message, run the primary agent, and extract the reply.
    async fn send_and_await(
        &self,
        conn: &ConnectionHandle,
        thread: &ThreadId,
        message: &str,
        profile: &PollProfile,
    ) -> Result<ChatMessage, OrchestratorError> {
        let _ = conn
            .agents
            .create_message(thread, MessageRole::User, message)
            .await?;
        let run = conn
            .agents
            .create_run(thread, &self.config.primary_agent_id)
            .await?;
        debug!(thread_id = %thread, run_id = %run.id, "run created");

        let _ = poller::wait_for_run(&conn.agents, thread, &run.id, profile).await?;
        counter!("conversation_turns_total").increment(1);

        extract::latest_reply(&conn.agents, thread).await
    }

    /// Best-effort remote rollback plus local reset after a failed start.
    ///
    /// Rollback failures are logged and never mask the original error.
    async fn rollback_failed_start(&self, conn: &ConnectionHandle, store: &dyn SessionStore) {
        let session = store.load_session();
        let nothing_created = session.thread_id.is_none()
            && session.file_ids.is_empty()
            && session.vector_store_ids.is_empty();
        if !nothing_created {
            let connected = if session.vector_store_ids.is_empty() {
                None
            } else {
                self.config.connected_agent_id.as_ref()
            };
            let report = cleanup::teardown(&conn.agents, &session, connected).await;
            if !report.is_clean() {
                warn!(
                    failures = report.failures.len(),
                    "failed-start rollback left remote resources behind"
                );
            }
        }
        Self::reset_local(store);
    }

    fn reset_local(store: &dyn SessionStore) {
        let mut session = store.load_session();
        session.reset();
        store.save_session(&session);
    }
}

/// RAII claim on a session's single turn slot.
#[derive(Debug)]
struct TurnGuard {
    turns: Arc<DashMap<String, ()>>,
    scope: String,
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        let _ = self.turns.remove(&self.scope);
        gauge!("conversation_turns_inflight").decrement(1.0);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use docchat_client::DeploymentEnvironment;
    use docchat_core::ids::AgentId;

    fn make_orchestrator() -> ConversationOrchestrator {
        ConversationOrchestrator::new(ChatConfig {
            endpoint: "https://svc.example".to_string(),
            primary_agent_id: AgentId::new("agent_primary"),
            connected_agent_id: Some(AgentId::new("agent_connected")),
            deployment: DeploymentEnvironment::Local,
            api_key: Some("sk-test".to_string()),
            poll_start: PollProfile::new_conversation(),
            poll_continue: PollProfile::continuation(),
        })
        .unwrap()
    }

    #[test]
    fn new_without_credentials_is_a_connection_error() {
        let err = ConversationOrchestrator::new(ChatConfig {
            endpoint: "https://svc.example".to_string(),
            primary_agent_id: AgentId::new("agent_primary"),
            connected_agent_id: None,
            deployment: DeploymentEnvironment::Local,
            api_key: None,
            poll_start: PollProfile::new_conversation(),
            poll_continue: PollProfile::continuation(),
        })
        .unwrap_err();
        assert_matches!(err, OrchestratorError::Connection { .. });
    }

    #[test]
    fn second_turn_for_same_scope_is_rejected() {
        let orch = make_orchestrator();
        let _guard = orch.begin_turn("user-1").unwrap();
        let err = orch.begin_turn("user-1").unwrap_err();
        assert_matches!(err, OrchestratorError::State(reason) if reason.contains("in progress"));
    }

    #[test]
    fn different_scopes_do_not_contend() {
        let orch = make_orchestrator();
        let _a = orch.begin_turn("user-1").unwrap();
        let _b = orch.begin_turn("user-2").unwrap();
    }

    #[test]
    fn orchestrator_and_guard_are_debuggable() {
        // unwrap/unwrap_err on results carrying these types needs Debug.
        let orch = make_orchestrator();
        assert!(format!("{orch:?}").contains("ConversationOrchestrator"));
        let guard = orch.begin_turn("user-1").unwrap();
        assert!(format!("{guard:?}").contains("TurnGuard"));
    }

    #[test]
    fn dropping_the_guard_frees_the_slot() {
        let orch = make_orchestrator();
        let guard = orch.begin_turn("user-1").unwrap();
        drop(guard);
        let _again = orch.begin_turn("user-1").unwrap();
    }
}
