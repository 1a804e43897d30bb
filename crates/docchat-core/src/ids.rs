//! Branded ID newtypes over the remote service's opaque identifiers.
//!
//! The Agent Service hands back plain strings for every object it creates.
//! Wrapping them keeps a thread handle from being passed where a file handle
//! is expected; serde sees straight through to the inner string.

use serde::{Deserialize, Serialize};

macro_rules! branded_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw remote identifier.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// The raw identifier string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

branded_id!(
    /// Handle to a document uploaded to the remote service.
    FileId
);
branded_id!(
    /// Handle to a remote vector-store search index.
    VectorStoreId
);
branded_id!(
    /// Handle to a remote conversation thread.
    ThreadId
);
branded_id!(
    /// Handle to one asynchronous agent run.
    RunId
);
branded_id!(
    /// Handle to a configured remote agent.
    AgentId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_serde_as_plain_string() {
        let id = FileId::new("file_abc123");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"file_abc123\"");

        let back: FileId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn display_matches_inner() {
        let id = ThreadId::from("thread_1");
        assert_eq!(id.to_string(), "thread_1");
        assert_eq!(id.as_str(), "thread_1");
    }

    #[test]
    fn distinct_brands_are_distinct_types() {
        // Compile-time property; just exercise the constructors.
        let f = FileId::new("x");
        let v = VectorStoreId::new("x");
        assert_eq!(f.as_str(), v.as_str());
    }
}
