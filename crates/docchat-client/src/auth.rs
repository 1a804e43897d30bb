//! Credential strategy selection and resolution.
//!
//! The deployment-environment signal picks the strategy: hosted processes
//! authenticate with a managed-identity token fetched from the platform
//! metadata endpoint; local development uses a configured API key. The
//! resolved [`AuthHeader`] is immutable for the life of the connection —
//! rotation and reconnect are out of scope.

use serde::Deserialize;
use tracing::info;

use crate::errors::ClientError;

/// Default platform metadata endpoint for managed-identity tokens.
const METADATA_TOKEN_URL: &str =
    "http://169.254.169.254/metadata/identity/oauth2/token?api-version=2018-02-01&resource=https%3A%2F%2Fai.agents";

/// Where the process is running, as far as credentials are concerned.
///
/// This signal selects the credential strategy and nothing else.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeploymentEnvironment {
    /// Running on the hosting platform; a managed identity is available.
    Hosted,
    /// Running on a developer machine; an API key is required.
    #[default]
    Local,
}

/// How to authenticate against the Agent Service.
#[derive(Clone, Debug)]
pub enum CredentialStrategy {
    /// Fetch a managed-identity token from the platform metadata endpoint.
    ManagedIdentity {
        /// Token endpoint URL (overridable for tests).
        token_endpoint: String,
    },
    /// Use a pre-shared API key.
    ApiKey {
        /// The key.
        key: String,
    },
}

impl CredentialStrategy {
    /// Pick the strategy for a deployment environment.
    ///
    /// `Local` requires `api_key`; its absence is an auth error surfaced
    /// before any network traffic happens.
    pub fn select(
        deployment: DeploymentEnvironment,
        api_key: Option<String>,
    ) -> Result<Self, ClientError> {
        match deployment {
            DeploymentEnvironment::Hosted => Ok(Self::ManagedIdentity {
                token_endpoint: METADATA_TOKEN_URL.to_string(),
            }),
            DeploymentEnvironment::Local => api_key
                .filter(|k| !k.is_empty())
                .map(|key| Self::ApiKey { key })
                .ok_or_else(|| ClientError::Auth {
                    reason: "no API key configured for local deployment".to_string(),
                }),
        }
    }

    /// Resolve the strategy to a concrete request header.
    ///
    /// Managed identity performs one token fetch; the API key strategy is
    /// purely local.
    #[tracing::instrument(skip_all)]
    pub async fn resolve(&self, http: &reqwest::Client) -> Result<AuthHeader, ClientError> {
        match self {
            Self::ApiKey { key } => Ok(AuthHeader::ApiKey(key.clone())),
            Self::ManagedIdentity { token_endpoint } => {
                let resp = http
                    .get(token_endpoint)
                    .header("Metadata", "true")
                    .send()
                    .await?;
                let status = resp.status().as_u16();
                if !resp.status().is_success() {
                    let body = resp.text().await.unwrap_or_default();
                    return Err(ClientError::Auth {
                        reason: format!("token endpoint returned {status}: {body}"),
                    });
                }
                let token: TokenResponse = resp.json().await?;
                info!("managed identity token acquired");
                Ok(AuthHeader::Bearer(token.access_token))
            }
        }
    }
}

/// Resolved credential applied to every Agent Service request.
#[derive(Clone, Debug)]
pub enum AuthHeader {
    /// `Authorization: Bearer <token>` (managed identity).
    Bearer(String),
    /// `api-key: <key>` (local development).
    ApiKey(String),
}

impl AuthHeader {
    /// Attach this credential to a request.
    #[must_use]
    pub fn apply(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            Self::Bearer(token) => req.bearer_auth(token),
            Self::ApiKey(key) => req.header("api-key", key),
        }
    }
}

/// Token endpoint response (only the field we use).
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn hosted_selects_managed_identity() {
        let strategy = CredentialStrategy::select(DeploymentEnvironment::Hosted, None).unwrap();
        assert_matches!(strategy, CredentialStrategy::ManagedIdentity { .. });
    }

    #[test]
    fn local_selects_api_key() {
        let strategy =
            CredentialStrategy::select(DeploymentEnvironment::Local, Some("sk-test".to_string()))
                .unwrap();
        assert_matches!(strategy, CredentialStrategy::ApiKey { key } if key == "sk-test");
    }

    #[test]
    fn local_without_key_is_an_auth_error() {
        let err = CredentialStrategy::select(DeploymentEnvironment::Local, None).unwrap_err();
        assert_matches!(err, ClientError::Auth { .. });

        let err =
            CredentialStrategy::select(DeploymentEnvironment::Local, Some(String::new()))
                .unwrap_err();
        assert_matches!(err, ClientError::Auth { .. });
    }

    #[tokio::test]
    async fn api_key_resolves_without_network() {
        let strategy = CredentialStrategy::ApiKey {
            key: "sk-test".to_string(),
        };
        let header = strategy.resolve(&reqwest::Client::new()).await.unwrap();
        assert_matches!(header, AuthHeader::ApiKey(key) if key == "sk-test");
    }

    #[tokio::test]
    async fn managed_identity_fetches_token_with_metadata_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/metadata/token"))
            .and(header("Metadata", "true"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "access_token": "tok_123" })),
            )
            .mount(&server)
            .await;

        let strategy = CredentialStrategy::ManagedIdentity {
            token_endpoint: format!("{}/metadata/token", server.uri()),
        };
        let header = strategy.resolve(&reqwest::Client::new()).await.unwrap();
        assert_matches!(header, AuthHeader::Bearer(token) if token == "tok_123");
    }

    #[tokio::test]
    async fn token_endpoint_failure_is_an_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("identity unavailable"))
            .mount(&server)
            .await;

        let strategy = CredentialStrategy::ManagedIdentity {
            token_endpoint: server.uri(),
        };
        let err = strategy.resolve(&reqwest::Client::new()).await.unwrap_err();
        assert_matches!(err, ClientError::Auth { reason } if reason.contains("500"));
    }
}
