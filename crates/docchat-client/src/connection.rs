//! Process-wide connection cache.
//!
//! Building the service handle is expensive (HTTP client construction plus
//! credential resolution, which may hit the platform token endpoint), so it
//! happens at most once per process. `tokio::sync::OnceCell` makes first use
//! single-flight under concurrent sessions; a failed init leaves the cell
//! empty so the next caller retries. The handle is immutable once built and
//! never invalidated here.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OnceCell;
use tracing::info;

use crate::auth::CredentialStrategy;
use crate::client::AgentsClient;
use crate::errors::ClientError;

/// Request timeout for every Agent Service call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// The cached pair: the raw HTTP client and the Agent Service client
/// derived from it.
#[derive(Clone, Debug)]
pub struct ConnectionHandle {
    /// Shared transport, reusable for side-channel requests.
    pub http: reqwest::Client,
    /// Agent Service operations.
    pub agents: AgentsClient,
}

/// Lazily builds and caches the [`ConnectionHandle`], shared by all sessions.
#[derive(Debug)]
pub struct ConnectionCache {
    endpoint: String,
    credentials: CredentialStrategy,
    handle: OnceCell<Arc<ConnectionHandle>>,
}

impl ConnectionCache {
    /// Create an empty cache for the given endpoint and credential strategy.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, credentials: CredentialStrategy) -> Self {
        Self {
            endpoint: endpoint.into(),
            credentials,
            handle: OnceCell::new(),
        }
    }

    /// Get the shared handle, building it on first use.
    ///
    /// Concurrent first calls are coalesced; exactly one init runs and every
    /// caller observes the same handle. An init failure propagates as
    /// [`ClientError`] and the next call starts a fresh attempt.
    pub async fn acquire(&self) -> Result<Arc<ConnectionHandle>, ClientError> {
        self.handle
            .get_or_try_init(|| async {
                let http = reqwest::Client::builder()
                    .timeout(REQUEST_TIMEOUT)
                    .build()?;
                let auth = self.credentials.resolve(&http).await?;
                let agents = AgentsClient::new(http.clone(), self.endpoint.clone(), auth);
                info!(endpoint = %self.endpoint, "agent service connection established");
                Ok(Arc::new(ConnectionHandle { http, agents }))
            })
            .await
            .cloned()
    }
}
