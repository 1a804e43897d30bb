//! Orchestration error taxonomy.
//!
//! Every failure a host can observe maps to one of these variants; raw
//! internal traces never reach the caller. [`OrchestratorError::user_message`]
//! gives the human-readable text hosts show alongside a false success flag.

use docchat_client::ClientError;

/// Errors surfaced by conversation orchestration.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// No documents could be uploaded on start.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Operation not permitted in the session's current state.
    #[error("invalid state: {0}")]
    State(String),

    /// The remote thread no longer exists; the session was reset.
    #[error("conversation session expired")]
    SessionExpired,

    /// The run did not reach a terminal state before the poll deadline.
    /// The remote run is left outstanding, not cancelled.
    #[error("run did not complete within {deadline_secs}s")]
    RunTimeout {
        /// Deadline that was exceeded, in seconds.
        deadline_secs: u64,
    },

    /// The run reached a terminal non-success state.
    #[error("run failed{}", fmt_run_failure(.message.as_deref()))]
    RunFailed {
        /// Remote-supplied error text, if any.
        message: Option<String>,
    },

    /// The remote service handle could not be established. Fatal.
    #[error("could not connect to the agent service: {reason}")]
    Connection {
        /// Error description.
        reason: String,
    },

    /// Any other remote failure, surfaced opaquely.
    #[error(transparent)]
    Client(#[from] ClientError),
}

fn fmt_run_failure(message: Option<&str>) -> String {
    message.map_or_else(String::new, |m| format!(": {m}"))
}

impl OrchestratorError {
    /// Human-readable text for hosts to display with a false success flag.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(_) => {
                "None of the documents could be uploaded. Please check the files and try again."
                    .to_string()
            }
            Self::State(reason) => format!("That action isn't available right now: {reason}."),
            Self::SessionExpired => {
                "The conversation has expired. Please start a new one.".to_string()
            }
            Self::RunTimeout { .. } => {
                "The assistant took too long to respond. Please try again.".to_string()
            }
            Self::RunFailed { message } => message.as_ref().map_or_else(
                || "The assistant could not complete the request.".to_string(),
                |m| format!("The assistant could not complete the request: {m}"),
            ),
            Self::Connection { .. } => {
                "The conversation service is unavailable. Please try again later.".to_string()
            }
            Self::Client(_) => "Something went wrong. Please try again.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_failed_display_includes_remote_message() {
        let err = OrchestratorError::RunFailed {
            message: Some("rate limited".to_string()),
        };
        assert!(err.to_string().contains("rate limited"));

        let err = OrchestratorError::RunFailed { message: None };
        assert_eq!(err.to_string(), "run failed");
    }

    #[test]
    fn timeout_display_includes_deadline() {
        let err = OrchestratorError::RunTimeout { deadline_secs: 120 };
        assert!(err.to_string().contains("120"));
    }

    #[test]
    fn user_messages_never_leak_internals() {
        let err = OrchestratorError::Client(ClientError::Api {
            status: 500,
            message: "stack trace at line 42".to_string(),
        });
        assert!(!err.user_message().contains("stack trace"));
    }

    #[test]
    fn every_variant_has_a_user_message() {
        let variants = [
            OrchestratorError::Validation("x".to_string()),
            OrchestratorError::State("x".to_string()),
            OrchestratorError::SessionExpired,
            OrchestratorError::RunTimeout { deadline_secs: 1 },
            OrchestratorError::RunFailed { message: None },
            OrchestratorError::Connection {
                reason: "x".to_string(),
            },
        ];
        for v in variants {
            assert!(!v.user_message().is_empty());
        }
    }
}
