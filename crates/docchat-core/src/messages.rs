//! Structured transcript records.
//!
//! The orchestrator emits [`ChatMessage`] values directly — role, content,
//! and timestamp as data. Hosts render these however they like; there is no
//! flattened "role: content" text form that needs re-parsing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// The human user.
    User,
    /// The remote agent.
    Assistant,
    /// System / service-generated content.
    System,
}

/// One transcript entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Author role.
    pub role: MessageRole,
    /// Message text. Non-text parts from the remote service are rendered as
    /// placeholder tokens referencing the attachment id.
    pub content: String,
    /// When the message was created.
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Build a user message stamped now.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::stamped(MessageRole::User, content, Utc::now())
    }

    /// Build an assistant message stamped now.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::stamped(MessageRole::Assistant, content, Utc::now())
    }

    /// Build a message with an explicit timestamp.
    #[must_use]
    pub fn stamped(
        role: MessageRole,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp,
        }
    }
}
