//! REST operations against the Agent Service.
//!
//! One method per remote operation the orchestrator consumes: document
//! upload/delete, vector-store create/delete, thread create/get/delete,
//! message create/list, run create/get, agent get/update. All operations are
//! plain awaited calls; retry policy lives with the callers.

use std::path::Path;

use docchat_core::ids::{AgentId, FileId, RunId, ThreadId, VectorStoreId};
use docchat_core::messages::MessageRole;
use tracing::debug;

use crate::auth::AuthHeader;
use crate::errors::ClientError;
use crate::types::{
    AgentObject, MessageList, MessageObject, RemoteFile, RunObject, ThreadObject, ToolResources,
    VectorStore,
};

/// Client for the Agent Service REST surface.
///
/// Cheap to clone; the underlying HTTP client is shared.
#[derive(Clone, Debug)]
pub struct AgentsClient {
    http: reqwest::Client,
    base_url: String,
    auth: AuthHeader,
}

impl AgentsClient {
    /// Create a client for the service at `base_url`.
    #[must_use]
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, auth: AuthHeader) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            let _ = base_url.pop();
        }
        Self {
            http,
            base_url,
            auth,
        }
    }

    /// Service endpoint this client talks to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Decode a successful response, or map a non-success status to
    /// [`ClientError::Api`] with the body as the message.
    async fn decode<T: serde::de::DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<T, ClientError> {
        let resp = Self::check(resp).await?;
        Ok(resp.json().await?)
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let message = resp.text().await.unwrap_or_default();
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Files
    // ─────────────────────────────────────────────────────────────────────

    /// Upload a local document, returning its remote handle.
    ///
    /// The display name is the path's final component. The caller owns the
    /// path's lifecycle; this client only reads it.
    pub async fn upload_file(&self, path: &Path) -> Result<RemoteFile, ClientError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| ClientError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let filename = path
            .file_name()
            .map_or_else(|| "document".to_string(), |n| n.to_string_lossy().into_owned());

        debug!(path = %path.display(), size = bytes.len(), "uploading document");

        let form = reqwest::multipart::Form::new()
            .text("purpose", "agents")
            .part(
                "file",
                reqwest::multipart::Part::bytes(bytes).file_name(filename),
            );

        let resp = self
            .auth
            .apply(self.http.post(self.url("/files")))
            .multipart(form)
            .send()
            .await?;
        Self::decode(resp).await
    }

    /// Delete an uploaded document.
    pub async fn delete_file(&self, id: &FileId) -> Result<(), ClientError> {
        let resp = self
            .auth
            .apply(self.http.delete(self.url(&format!("/files/{id}"))))
            .send()
            .await?;
        let _ = Self::check(resp).await?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Vector stores
    // ─────────────────────────────────────────────────────────────────────

    /// Create a search index over a fixed set of uploaded documents.
    pub async fn create_vector_store(
        &self,
        name: &str,
        file_ids: &[FileId],
    ) -> Result<VectorStore, ClientError> {
        let body = serde_json::json!({ "name": name, "file_ids": file_ids });
        let resp = self
            .auth
            .apply(self.http.post(self.url("/vector_stores")))
            .json(&body)
            .send()
            .await?;
        Self::decode(resp).await
    }

    /// Delete a search index.
    pub async fn delete_vector_store(&self, id: &VectorStoreId) -> Result<(), ClientError> {
        let resp = self
            .auth
            .apply(self.http.delete(self.url(&format!("/vector_stores/{id}"))))
            .send()
            .await?;
        let _ = Self::check(resp).await?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Threads and messages
    // ─────────────────────────────────────────────────────────────────────

    /// Create an empty conversation thread.
    pub async fn create_thread(&self) -> Result<ThreadObject, ClientError> {
        let resp = self
            .auth
            .apply(self.http.post(self.url("/threads")))
            .json(&serde_json::json!({}))
            .send()
            .await?;
        Self::decode(resp).await
    }

    /// Fetch an existing thread by handle.
    pub async fn get_thread(&self, id: &ThreadId) -> Result<ThreadObject, ClientError> {
        let resp = self
            .auth
            .apply(self.http.get(self.url(&format!("/threads/{id}"))))
            .send()
            .await?;
        Self::decode(resp).await
    }

    /// Delete a thread and its message log.
    pub async fn delete_thread(&self, id: &ThreadId) -> Result<(), ClientError> {
        let resp = self
            .auth
            .apply(self.http.delete(self.url(&format!("/threads/{id}"))))
            .send()
            .await?;
        let _ = Self::check(resp).await?;
        Ok(())
    }

    /// Post one message into a thread.
    pub async fn create_message(
        &self,
        thread: &ThreadId,
        role: MessageRole,
        content: &str,
    ) -> Result<MessageObject, ClientError> {
        let body = serde_json::json!({ "role": role, "content": content });
        let resp = self
            .auth
            .apply(
                self.http
                    .post(self.url(&format!("/threads/{thread}/messages"))),
            )
            .json(&body)
            .send()
            .await?;
        Self::decode(resp).await
    }

    /// List thread messages, most recent first, at most `limit`.
    pub async fn list_messages(
        &self,
        thread: &ThreadId,
        limit: u32,
    ) -> Result<Vec<MessageObject>, ClientError> {
        let resp = self
            .auth
            .apply(
                self.http
                    .get(self.url(&format!("/threads/{thread}/messages")))
                    .query(&[("limit", limit.to_string().as_str()), ("order", "desc")]),
            )
            .send()
            .await?;
        let list: MessageList = Self::decode(resp).await?;
        Ok(list.data)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Runs
    // ─────────────────────────────────────────────────────────────────────

    /// Create a run of `agent` against `thread`.
    pub async fn create_run(
        &self,
        thread: &ThreadId,
        agent: &AgentId,
    ) -> Result<RunObject, ClientError> {
        let body = serde_json::json!({ "agent_id": agent });
        let resp = self
            .auth
            .apply(self.http.post(self.url(&format!("/threads/{thread}/runs"))))
            .json(&body)
            .send()
            .await?;
        Self::decode(resp).await
    }

    /// Fetch the current state of a run.
    pub async fn get_run(&self, thread: &ThreadId, run: &RunId) -> Result<RunObject, ClientError> {
        let resp = self
            .auth
            .apply(
                self.http
                    .get(self.url(&format!("/threads/{thread}/runs/{run}"))),
            )
            .send()
            .await?;
        Self::decode(resp).await
    }

    // ─────────────────────────────────────────────────────────────────────
    // Agents
    // ─────────────────────────────────────────────────────────────────────

    /// Fetch an agent's configuration.
    pub async fn get_agent(&self, id: &AgentId) -> Result<AgentObject, ClientError> {
        let resp = self
            .auth
            .apply(self.http.get(self.url(&format!("/agents/{id}"))))
            .send()
            .await?;
        Self::decode(resp).await
    }

    /// Replace an agent's tool resource configuration.
    pub async fn update_agent(
        &self,
        id: &AgentId,
        tool_resources: &ToolResources,
    ) -> Result<AgentObject, ClientError> {
        let body = serde_json::json!({ "tool_resources": tool_resources });
        let resp = self
            .auth
            .apply(self.http.post(self.url(&format!("/agents/{id}"))))
            .json(&body)
            .send()
            .await?;
        Self::decode(resp).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> AgentsClient {
        AgentsClient::new(
            reqwest::Client::new(),
            server.uri(),
            AuthHeader::ApiKey("sk-test".to_string()),
        )
    }

    #[test]
    fn trailing_slashes_are_trimmed() {
        let client = AgentsClient::new(
            reqwest::Client::new(),
            "https://svc.example//",
            AuthHeader::ApiKey("k".to_string()),
        );
        assert_eq!(client.base_url(), "https://svc.example");
    }

    #[tokio::test]
    async fn upload_file_posts_multipart_and_decodes_handle() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/files"))
            .and(header("api-key", "sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "file_1", "filename": "notes.txt"
            })))
            .mount(&server)
            .await;

        let mut doc = tempfile::NamedTempFile::with_suffix(".txt").unwrap();
        writeln!(doc, "hello docs").unwrap();

        let file = client_for(&server).upload_file(doc.path()).await.unwrap();
        assert_eq!(file.id.as_str(), "file_1");
        assert_eq!(file.filename, "notes.txt");
    }

    #[tokio::test]
    async fn upload_missing_file_is_an_io_error() {
        let server = MockServer::start().await;
        let err = client_for(&server)
            .upload_file(Path::new("/nonexistent/report.pdf"))
            .await
            .unwrap_err();
        assert_matches!(err, ClientError::Io { path, .. } if path.contains("report.pdf"));
    }

    #[tokio::test]
    async fn create_vector_store_sends_file_ids() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/vector_stores"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "vs_1", "name": "docs"
            })))
            .mount(&server)
            .await;

        let store = client_for(&server)
            .create_vector_store("docs", &[FileId::new("file_1"), FileId::new("file_2")])
            .await
            .unwrap();
        assert_eq!(store.id.as_str(), "vs_1");

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = requests[0].body_json().unwrap();
        assert_eq!(body["file_ids"], serde_json::json!(["file_1", "file_2"]));
    }

    #[tokio::test]
    async fn thread_lifecycle_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/threads"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "id": "thread_1" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/threads/thread_1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "id": "thread_1" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/threads/thread_1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "thread_1", "deleted": true
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let thread = client.create_thread().await.unwrap();
        assert_eq!(client.get_thread(&thread.id).await.unwrap().id, thread.id);
        client.delete_thread(&thread.id).await.unwrap();
    }

    #[tokio::test]
    async fn get_missing_thread_maps_status_to_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("No thread found"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .get_thread(&ThreadId::new("thread_gone"))
            .await
            .unwrap_err();
        assert_matches!(
            err,
            ClientError::Api { status: 404, message } if message.contains("No thread found")
        );
    }

    #[tokio::test]
    async fn create_message_posts_role_and_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/threads/thread_1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "msg_1", "role": "user",
                "content": [{ "type": "text", "text": { "value": "hi" } }]
            })))
            .mount(&server)
            .await;

        let msg = client_for(&server)
            .create_message(&ThreadId::new("thread_1"), MessageRole::User, "hi")
            .await
            .unwrap();
        assert_eq!(msg.role, "user");

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = requests[0].body_json().unwrap();
        assert_eq!(body["role"], "user");
        assert_eq!(body["content"], "hi");
    }

    #[tokio::test]
    async fn list_messages_requests_descending_with_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/threads/thread_1/messages"))
            .and(query_param("limit", "1"))
            .and(query_param("order", "desc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{
                    "id": "msg_2", "role": "assistant",
                    "content": [{ "type": "text", "text": { "value": "answer" } }],
                    "created_at": 1_700_000_000
                }]
            })))
            .mount(&server)
            .await;

        let messages = client_for(&server)
            .list_messages(&ThreadId::new("thread_1"), 1)
            .await
            .unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "assistant");
    }

    #[tokio::test]
    async fn run_create_and_get() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/threads/thread_1/runs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "run_1", "status": "queued"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/threads/thread_1/runs/run_1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "run_1", "status": "completed"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let thread = ThreadId::new("thread_1");
        let run = client
            .create_run(&thread, &AgentId::new("agent_primary"))
            .await
            .unwrap();
        assert_eq!(run.status, crate::types::RunStatus::Queued);

        let run = client.get_run(&thread, &run.id).await.unwrap();
        assert_eq!(run.status, crate::types::RunStatus::Completed);
    }

    #[tokio::test]
    async fn update_agent_pushes_tool_resources() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/agents/agent_connected"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "agent_connected",
                "tool_resources": { "file_search": { "vector_store_ids": ["vs_1"] } }
            })))
            .mount(&server)
            .await;

        let resources =
            ToolResources::with_vector_stores(vec![VectorStoreId::new("vs_1")]);
        let agent = client_for(&server)
            .update_agent(&AgentId::new("agent_connected"), &resources)
            .await
            .unwrap();
        assert_eq!(
            agent.tool_resources.unwrap().file_search.unwrap().vector_store_ids,
            vec![VectorStoreId::new("vs_1")]
        );

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = requests[0].body_json().unwrap();
        assert_eq!(
            body["tool_resources"]["file_search"]["vector_store_ids"],
            serde_json::json!(["vs_1"])
        );
    }
}
