//! # docchat-client
//!
//! Client for the remote conversational Agent Service.
//!
//! Follows the composition pattern of one entry-point client per remote
//! surface: [`client::AgentsClient`] (REST operations), [`auth`]
//! (credential strategy → auth header), [`connection`] (process-wide
//! single-flight connection cache), and [`types`] (wire shapes).
//!
//! The service is treated as an opaque remote capability: identifiers are
//! opaque strings (branded in `docchat-core`), and the client owns no wire
//! format beyond what the operations listed here consume.
//!
//! ## Crate Position
//!
//! Depends on: docchat-core. Depended on by: docchat-runtime.

#![deny(unsafe_code)]

pub mod auth;
pub mod client;
pub mod connection;
pub mod errors;
pub mod types;

pub use auth::{AuthHeader, CredentialStrategy, DeploymentEnvironment};
pub use client::AgentsClient;
pub use connection::{ConnectionCache, ConnectionHandle};
pub use errors::ClientError;
