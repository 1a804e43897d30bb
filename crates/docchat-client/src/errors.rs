//! Agent Service client errors.

/// Errors raised by the Agent Service client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure (connect, TLS, timeout, body decode).
    #[error("agent service request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("agent service returned {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, best-effort.
        message: String,
    },

    /// A local document could not be read for upload.
    #[error("failed to read document {path}: {reason}")]
    Io {
        /// Local path of the document.
        path: String,
        /// Error description.
        reason: String,
    },

    /// No usable credential could be established.
    #[error("credential resolution failed: {reason}")]
    Auth {
        /// Error description.
        reason: String,
    },
}
