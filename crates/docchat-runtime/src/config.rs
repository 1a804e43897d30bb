//! Orchestrator configuration.
//!
//! Loaded from `DOCCHAT_*` environment variables over compiled defaults.
//! The deployment signal exists only to pick a credential strategy; no other
//! behavior depends on the environment.

use std::collections::HashMap;

use docchat_client::DeploymentEnvironment;
use docchat_core::ids::AgentId;

use crate::poller::PollProfile;

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("missing required configuration: {var}")]
    Missing {
        /// Variable name.
        var: String,
    },
    /// A variable is set to a value this crate does not understand.
    #[error("invalid value for {var}: {value}")]
    Invalid {
        /// Variable name.
        var: String,
        /// The offending value.
        value: String,
    },
}

/// Everything the orchestrator needs to know about its environment.
#[derive(Clone, Debug)]
pub struct ChatConfig {
    /// Agent Service endpoint.
    pub endpoint: String,
    /// Agent that runs conversation turns.
    pub primary_agent_id: AgentId,
    /// Agent owning the document-search tool, if one is configured.
    pub connected_agent_id: Option<AgentId>,
    /// Credential-strategy signal.
    pub deployment: DeploymentEnvironment,
    /// API key for local deployments.
    pub api_key: Option<String>,
    /// Poll tuning for new-conversation turns (more server-side setup work,
    /// so more generous).
    pub poll_start: PollProfile,
    /// Poll tuning for continuation turns.
    pub poll_continue: PollProfile,
}

impl ChatConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(&std::env::vars().collect())
    }

    /// Load configuration from an explicit variable map.
    ///
    /// Pure core of [`ChatConfig::from_env`], used directly by tests.
    pub fn from_env_map(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let require = |var: &str| {
            vars.get(var)
                .filter(|v| !v.is_empty())
                .cloned()
                .ok_or_else(|| ConfigError::Missing {
                    var: var.to_string(),
                })
        };

        let deployment = match vars.get("DOCCHAT_DEPLOYMENT").map(String::as_str) {
            None | Some("local") => DeploymentEnvironment::Local,
            Some("hosted") => DeploymentEnvironment::Hosted,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "DOCCHAT_DEPLOYMENT".to_string(),
                    value: other.to_string(),
                });
            }
        };

        Ok(Self {
            endpoint: require("DOCCHAT_ENDPOINT")?,
            primary_agent_id: AgentId::new(require("DOCCHAT_PRIMARY_AGENT_ID")?),
            connected_agent_id: vars
                .get("DOCCHAT_CONNECTED_AGENT_ID")
                .filter(|v| !v.is_empty())
                .map(AgentId::new),
            deployment,
            api_key: vars.get("DOCCHAT_API_KEY").cloned(),
            poll_start: PollProfile::new_conversation(),
            poll_continue: PollProfile::continuation(),
        })
    }
}
