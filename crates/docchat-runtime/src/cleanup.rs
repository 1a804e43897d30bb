//! Best-effort teardown of tracked remote resources.
//!
//! Deletion order is fixed: vector stores, then the connected agent's
//! document-search detach, then files, then the thread. Every step is
//! best-effort — a failed deletion is logged and recorded, and the batch
//! always runs to completion so one stuck resource never strands the rest.
//! Only the caller's inability to reach the service at all is fatal, and
//! that is surfaced before this module runs.

use docchat_client::AgentsClient;
use docchat_client::types::ToolResources;
use docchat_core::ids::AgentId;
use docchat_core::session::ConversationSession;
use metrics::counter;
use tracing::{debug, warn};

/// What kind of resource a cleanup step was operating on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    /// A vector-store search index.
    VectorStore,
    /// The connected agent's document-search attachment.
    AgentDetach,
    /// An uploaded document.
    File,
    /// The conversation thread.
    Thread,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::VectorStore => "vector_store",
            Self::AgentDetach => "agent_detach",
            Self::File => "file",
            Self::Thread => "thread",
        };
        f.write_str(name)
    }
}

/// One resource that could not be reclaimed.
#[derive(Clone, Debug)]
pub struct CleanupFailure {
    /// Resource kind.
    pub kind: ResourceKind,
    /// Remote id of the resource.
    pub id: String,
    /// Error description.
    pub reason: String,
}

/// Outcome of one teardown pass.
#[derive(Clone, Debug, Default)]
pub struct CleanupReport {
    /// Resources that could not be reclaimed. Empty on a clean teardown.
    pub failures: Vec<CleanupFailure>,
}

impl CleanupReport {
    /// Whether every resource was reclaimed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, kind: ResourceKind, id: &str, reason: impl std::fmt::Display) {
        warn!(resource = %kind, id, reason = %reason, "cleanup step failed; continuing");
        counter!("cleanup_failures_total").increment(1);
        self.failures.push(CleanupFailure {
            kind,
            id: id.to_string(),
            reason: reason.to_string(),
        });
    }
}

/// Delete every resource recorded in `session`, in fixed order.
///
/// `connected_agent` is detached (its document-search attachment cleared and
/// the configuration pushed back) only when the session actually holds
/// vector stores.
pub async fn teardown(
    agents: &AgentsClient,
    session: &ConversationSession,
    connected_agent: Option<&AgentId>,
) -> CleanupReport {
    let mut report = CleanupReport::default();

    for id in &session.vector_store_ids {
        match agents.delete_vector_store(id).await {
            Ok(()) => debug!(vector_store_id = %id, "vector store deleted"),
            Err(e) => report.record(ResourceKind::VectorStore, id.as_str(), e),
        }
    }

    if let Some(agent_id) = connected_agent {
        if !session.vector_store_ids.is_empty() {
            match detach_agent(agents, agent_id).await {
                Ok(()) => debug!(agent_id = %agent_id, "connected agent detached"),
                Err(e) => report.record(ResourceKind::AgentDetach, agent_id.as_str(), e),
            }
        }
    }

    for id in &session.file_ids {
        match agents.delete_file(id).await {
            Ok(()) => debug!(file_id = %id, "document deleted"),
            Err(e) => report.record(ResourceKind::File, id.as_str(), e),
        }
    }

    if let Some(thread_id) = &session.thread_id {
        match agents.delete_thread(thread_id).await {
            Ok(()) => debug!(thread_id = %thread_id, "thread deleted"),
            Err(e) => report.record(ResourceKind::Thread, thread_id.as_str(), e),
        }
    }

    report
}

/// Clear the agent's document-search attachment and push the cleared
/// configuration back.
async fn detach_agent(
    agents: &AgentsClient,
    agent_id: &AgentId,
) -> Result<(), docchat_client::ClientError> {
    // Fetch first so a missing agent reads as one detach failure, not a
    // spurious config overwrite.
    let _ = agents.get_agent(agent_id).await?;
    let _ = agents.update_agent(agent_id, &ToolResources::detached()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_is_clean() {
        assert!(CleanupReport::default().is_clean());
    }

    #[test]
    fn recorded_failure_marks_report_dirty() {
        let mut report = CleanupReport::default();
        report.record(ResourceKind::File, "file_1", "410 gone");
        assert!(!report.is_clean());
        assert_eq!(report.failures[0].kind, ResourceKind::File);
        assert_eq!(report.failures[0].id, "file_1");
    }

    #[test]
    fn resource_kind_display_names() {
        assert_eq!(ResourceKind::VectorStore.to_string(), "vector_store");
        assert_eq!(ResourceKind::AgentDetach.to_string(), "agent_detach");
        assert_eq!(ResourceKind::File.to_string(), "file");
        assert_eq!(ResourceKind::Thread.to_string(), "thread");
    }
}
