//! Assistant reply extraction.
//!
//! After a run completes, the single most-recent thread message is fetched
//! and flattened into one structured [`ChatMessage`]. Text spans are taken
//! verbatim; image attachments become placeholder tokens referencing the
//! remote file id. If the newest message is still the user's own echo (no
//! assistant reply landed), a soft no-response marker is returned rather
//! than failing the turn.

use chrono::{DateTime, Utc};
use docchat_client::AgentsClient;
use docchat_client::types::MessageContent;
use docchat_core::ids::ThreadId;
use docchat_core::messages::{ChatMessage, MessageRole};
use tracing::debug;

use crate::errors::OrchestratorError;

/// Content of the soft marker emitted when no assistant reply is found.
pub const NO_REPLY: &str = "(no response received)";

/// Fetch and flatten the latest assistant reply in `thread`.
pub async fn latest_reply(
    agents: &AgentsClient,
    thread: &ThreadId,
) -> Result<ChatMessage, OrchestratorError> {
    let messages = agents.list_messages(thread, 1).await?;
    let Some(newest) = messages.first() else {
        debug!(thread_id = %thread, "thread has no messages after completed run");
        return Ok(ChatMessage::assistant(NO_REPLY));
    };

    if newest.role == "user" {
        debug!(thread_id = %thread, "newest message is the user's own; no reply found");
        return Ok(ChatMessage::assistant(NO_REPLY));
    }

    let timestamp = newest
        .created_at
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or_else(Utc::now);

    Ok(ChatMessage::stamped(
        MessageRole::Assistant,
        flatten_content(&newest.content),
        timestamp,
    ))
}

/// Concatenate message content parts in order.
///
/// Text is verbatim, image parts render as `[image: <file id>]`, and part
/// kinds this client does not understand are skipped.
#[must_use]
pub fn flatten_content(parts: &[MessageContent]) -> String {
    let mut rendered = Vec::with_capacity(parts.len());
    for part in parts {
        match part {
            MessageContent::Text { text } => rendered.push(text.value.clone()),
            MessageContent::ImageFile { image_file } => {
                rendered.push(format!("[image: {}]", image_file.file_id));
            }
            MessageContent::Unknown => {}
        }
    }
    rendered.join("\n")
}
