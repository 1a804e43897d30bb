//! # docchat-runtime
//!
//! Conversation orchestration over the remote Agent Service.
//!
//! - **Orchestrator**: the start / continue / end state machine, one turn at
//!   a time per session
//! - **Resource tracker**: session-scoped ledger of remote object ids
//! - **Run poller**: adaptive-delay, deadline-bounded polling of a run to a
//!   terminal state
//! - **Extraction**: latest assistant reply as a structured message
//! - **Cleanup**: best-effort teardown of every tracked remote resource
//! - **Config**: endpoint, agent ids, and credential signal from `DOCCHAT_*`
//!   environment variables
//!
//! ## Crate Position
//!
//! Aggregation layer. Depends on: docchat-core, docchat-client.

#![deny(unsafe_code)]

pub mod cleanup;
pub mod config;
pub mod errors;
pub mod extract;
pub mod orchestrator;
pub mod poller;
pub mod tracker;

pub use cleanup::{CleanupFailure, CleanupReport, ResourceKind};
pub use config::{ChatConfig, ConfigError};
pub use errors::OrchestratorError;
pub use orchestrator::ConversationOrchestrator;
pub use poller::PollProfile;
pub use tracker::ResourceTracker;
