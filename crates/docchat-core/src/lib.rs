//! # docchat-core
//!
//! Foundation types for the docchat conversation orchestrator.
//!
//! This crate provides the shared vocabulary the client and runtime crates
//! depend on:
//!
//! - **Branded IDs**: [`ids::FileId`], [`ids::VectorStoreId`], [`ids::ThreadId`],
//!   [`ids::RunId`], [`ids::AgentId`] as newtypes over the remote service's
//!   opaque identifiers
//! - **Messages**: [`messages::ChatMessage`] structured role/content/timestamp
//!   transcript records
//! - **Session**: [`session::ConversationSession`] record and the
//!   [`session::SessionStore`] capability injected into every orchestrator call
//! - **Logging**: [`logging::init_tracing`] for hosting processes
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by `docchat-client` and `docchat-runtime`.

#![deny(unsafe_code)]

pub mod ids;
pub mod logging;
pub mod messages;
pub mod session;
