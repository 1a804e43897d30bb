//! Wire shapes for the Agent Service REST surface.
//!
//! Only the fields this system consumes are modeled; everything else the
//! service returns is ignored by serde. Message content is a typed list of
//! parts with an `Unknown` catch-all so new part kinds never break decoding.

use docchat_core::ids::{AgentId, FileId, RunId, ThreadId, VectorStoreId};
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Files and vector stores
// ─────────────────────────────────────────────────────────────────────────────

/// A document uploaded to the service.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct RemoteFile {
    /// Remote handle.
    pub id: FileId,
    /// Display name as stored by the service.
    pub filename: String,
}

/// A search index built over a fixed set of uploaded documents.
///
/// Immutable once created; deleted as a whole during teardown.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct VectorStore {
    /// Remote handle.
    pub id: VectorStoreId,
    /// Optional display name.
    #[serde(default)]
    pub name: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Threads and messages
// ─────────────────────────────────────────────────────────────────────────────

/// An ordered remote message log underlying one conversation.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ThreadObject {
    /// Remote handle.
    pub id: ThreadId,
}

/// One content part of a thread message.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    /// A text span.
    Text {
        /// Text payload.
        text: TextPayload,
    },
    /// An inline image attachment reference.
    ImageFile {
        /// Attachment reference.
        image_file: ImageFileRef,
    },
    /// Any part kind this client does not understand.
    #[serde(other)]
    Unknown,
}

/// Text payload of a [`MessageContent::Text`] part.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct TextPayload {
    /// The text itself.
    pub value: String,
}

/// Attachment reference of a [`MessageContent::ImageFile`] part.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ImageFileRef {
    /// Remote handle of the attached file.
    pub file_id: FileId,
}

/// A message stored in a thread.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct MessageObject {
    /// Remote message id.
    pub id: String,
    /// Author role as reported by the service (`user`, `assistant`, ...).
    pub role: String,
    /// Ordered content parts.
    #[serde(default)]
    pub content: Vec<MessageContent>,
    /// Creation time, seconds since the epoch.
    #[serde(default)]
    pub created_at: Option<i64>,
}

/// Recency-ordered page of thread messages.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct MessageList {
    /// Messages, most recent first when listed descending.
    #[serde(default)]
    pub data: Vec<MessageObject>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Runs
// ─────────────────────────────────────────────────────────────────────────────

/// Lifecycle states of an asynchronous agent run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Accepted, not yet started.
    Queued,
    /// Executing server-side.
    InProgress,
    /// Finished successfully.
    Completed,
    /// Finished with an error.
    Failed,
    /// Terminated before completion.
    Cancelled,
}

impl RunStatus {
    /// Whether this status is terminal (the run will not change again).
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// Remote-supplied failure detail on a terminal run.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct RunError {
    /// Machine-readable error code, if any.
    #[serde(default)]
    pub code: Option<String>,
    /// Human-readable message.
    pub message: String,
}

/// One asynchronous execution of an agent against a thread.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct RunObject {
    /// Remote handle.
    pub id: RunId,
    /// Current lifecycle state.
    pub status: RunStatus,
    /// Failure detail, present on failed runs.
    #[serde(default)]
    pub last_error: Option<RunError>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Agents
// ─────────────────────────────────────────────────────────────────────────────

/// Vector stores wired into an agent's document-search tool.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSearchResources {
    /// Attached search indices.
    #[serde(default)]
    pub vector_store_ids: Vec<VectorStoreId>,
}

/// Tool resource configuration carried by an agent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResources {
    /// Document-search tool resources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_search: Option<FileSearchResources>,
}

impl ToolResources {
    /// Configuration attaching exactly the given vector stores.
    #[must_use]
    pub fn with_vector_stores(ids: Vec<VectorStoreId>) -> Self {
        Self {
            file_search: Some(FileSearchResources {
                vector_store_ids: ids,
            }),
        }
    }

    /// Configuration with the document-search attachment cleared.
    #[must_use]
    pub fn detached() -> Self {
        Self {
            file_search: Some(FileSearchResources::default()),
        }
    }
}

/// A configured remote agent.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct AgentObject {
    /// Remote handle.
    pub id: AgentId,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Tool resource configuration.
    #[serde(default)]
    pub tool_resources: Option<ToolResources>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_status_terminality() {
        assert!(!RunStatus::Queued.is_terminal());
        assert!(!RunStatus::InProgress.is_terminal());
        assert!(RunStatus::Completed.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
        assert!(RunStatus::Cancelled.is_terminal());
    }

    #[test]
    fn run_status_decodes_snake_case() {
        let status: RunStatus = serde_json::from_str("\"in_progress\"").unwrap();
        assert_eq!(status, RunStatus::InProgress);
    }

    #[test]
    fn message_content_decodes_text_and_image_parts() {
        let json = serde_json::json!([
            { "type": "text", "text": { "value": "hello" } },
            { "type": "image_file", "image_file": { "file_id": "file_img" } },
        ]);
        let parts: Vec<MessageContent> = serde_json::from_value(json).unwrap();
        assert_eq!(parts.len(), 2);
        assert!(matches!(parts[0], MessageContent::Text { .. }));
        assert!(matches!(parts[1], MessageContent::ImageFile { .. }));
    }

    #[test]
    fn unknown_content_part_does_not_break_decoding() {
        let json = serde_json::json!({ "type": "file_citation_hologram" });
        let part: MessageContent = serde_json::from_value(json).unwrap();
        assert_eq!(part, MessageContent::Unknown);
    }

    #[test]
    fn run_decodes_with_last_error() {
        let json = serde_json::json!({
            "id": "run_1",
            "status": "failed",
            "last_error": { "code": "server_error", "message": "boom" },
        });
        let run: RunObject = serde_json::from_value(json).unwrap();
        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.last_error.unwrap().message, "boom");
    }

    #[test]
    fn tool_resources_detached_serializes_empty_list() {
        let json = serde_json::to_value(ToolResources::detached()).unwrap();
        assert!(
            json["file_search"]["vector_store_ids"]
                .as_array()
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn agent_decodes_without_tool_resources() {
        let json = serde_json::json!({ "id": "agent_1" });
        let agent: AgentObject = serde_json::from_value(json).unwrap();
        assert!(agent.tool_resources.is_none());
    }
}
