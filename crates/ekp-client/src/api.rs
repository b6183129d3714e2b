// ABOUTME: Data access functions, one per knowledge service operation
// ABOUTME: KnowledgeApi trait plus the reqwest-backed HttpApi implementation

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::endpoints::Endpoints;
use crate::error::{ClientError, Result};
use crate::models::{
    AgentQueryRequest, AgentQueryResponse, AgentSessionHistory, Document, FileUpload,
    HealthStatus, QaRecord, QaRequest, ToolList, UploadResponse,
};

/// Backend operations used by the cache layer and the conversational sessions.
///
/// Each call performs exactly one request; there are no retries.
#[async_trait]
pub trait KnowledgeApi: Send + Sync {
    async fn list_documents(&self) -> Result<Vec<Document>>;
    async fn get_document(&self, id: i64) -> Result<Document>;
    async fn upload_document(&self, file: FileUpload) -> Result<UploadResponse>;
    async fn delete_document(&self, id: i64) -> Result<()>;

    async fn ask(&self, request: &QaRequest) -> Result<QaRecord>;
    async fn qa_history(&self) -> Result<Vec<QaRecord>>;
    async fn get_qa_record(&self, id: i64) -> Result<QaRecord>;

    async fn agent_query(&self, request: &AgentQueryRequest) -> Result<AgentQueryResponse>;
    async fn agent_session(&self, session_id: &str) -> Result<AgentSessionHistory>;
    async fn clear_agent_session(&self, session_id: &str) -> Result<()>;
    async fn agent_tools(&self) -> Result<ToolList>;

    async fn health(&self) -> Result<HealthStatus>;
    async fn biz_health(&self) -> Result<HealthStatus>;
}

/// HTTP/JSON implementation of [`KnowledgeApi`].
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    endpoints: Endpoints,
}

impl HttpApi {
    /// Create a client with platform-default timeouts.
    pub fn new(endpoints: Endpoints) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("ekp-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, endpoints })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    async fn send(&self, operation: &'static str, req: RequestBuilder) -> Result<reqwest::Response> {
        let resp = req
            .send()
            .await
            .map_err(|e| ClientError::network(operation, e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            debug!(operation, status = status.as_u16(), "request failed");
            return Err(ClientError::Status {
                operation,
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp)
    }

    async fn json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        req: RequestBuilder,
    ) -> Result<T> {
        let resp = self.send(operation, req).await?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ClientError::network(operation, e))?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::decode(operation, e))
    }

    async fn empty(&self, operation: &'static str, req: RequestBuilder) -> Result<()> {
        // Body, if any, is ignored
        self.send(operation, req).await.map(|_| ())
    }
}

#[async_trait]
impl KnowledgeApi for HttpApi {
    async fn list_documents(&self) -> Result<Vec<Document>> {
        let url = self.endpoints.documents();
        debug!(%url, "listing documents");
        self.json("list documents", self.client.get(url)).await
    }

    async fn get_document(&self, id: i64) -> Result<Document> {
        let url = self.endpoints.document(id);
        debug!(%url, "fetching document");
        self.json("get document", self.client.get(url)).await
    }

    async fn upload_document(&self, file: FileUpload) -> Result<UploadResponse> {
        let url = self.endpoints.documents();
        debug!(%url, file = %file.file_name, size = file.bytes.len(), "uploading document");

        let mut part = reqwest::multipart::Part::bytes(file.bytes).file_name(file.file_name);
        if let Some(mime) = file.mime_type {
            part = part.mime_str(&mime).map_err(|e| {
                ClientError::InvalidRequest(format!("invalid mime type '{}': {}", mime, e))
            })?;
        }
        let form = reqwest::multipart::Form::new().part("file", part);

        self.json("upload document", self.client.post(url).multipart(form))
            .await
    }

    async fn delete_document(&self, id: i64) -> Result<()> {
        let url = self.endpoints.document(id);
        debug!(%url, "deleting document");
        self.empty("delete document", self.client.delete(url)).await
    }

    async fn ask(&self, request: &QaRequest) -> Result<QaRecord> {
        let url = self.endpoints.qa();
        debug!(%url, top_k = ?request.top_k, "asking question");
        self.json("ask question", self.client.post(url).json(request))
            .await
    }

    async fn qa_history(&self) -> Result<Vec<QaRecord>> {
        let url = self.endpoints.qa_history();
        debug!(%url, "fetching qa history");
        self.json("qa history", self.client.get(url)).await
    }

    async fn get_qa_record(&self, id: i64) -> Result<QaRecord> {
        let url = self.endpoints.qa_record(id);
        debug!(%url, "fetching qa record");
        self.json("get qa record", self.client.get(url)).await
    }

    async fn agent_query(&self, request: &AgentQueryRequest) -> Result<AgentQueryResponse> {
        let url = self.endpoints.agent_query();
        debug!(%url, session = %request.session_id, "querying agent");
        self.json("agent query", self.client.post(url).json(request))
            .await
    }

    async fn agent_session(&self, session_id: &str) -> Result<AgentSessionHistory> {
        let url = self.endpoints.agent_session(session_id);
        debug!(%url, "fetching agent session");
        self.json("agent session", self.client.get(url)).await
    }

    async fn clear_agent_session(&self, session_id: &str) -> Result<()> {
        let url = self.endpoints.agent_session(session_id);
        debug!(%url, "clearing agent session");
        self.empty("clear agent session", self.client.delete(url))
            .await
    }

    async fn agent_tools(&self) -> Result<ToolList> {
        let url = self.endpoints.agent_tools();
        debug!(%url, "listing agent tools");
        self.json("agent tools", self.client.get(url)).await
    }

    async fn health(&self) -> Result<HealthStatus> {
        let url = self.endpoints.health();
        self.json("health", self.client.get(url)).await
    }

    async fn biz_health(&self) -> Result<HealthStatus> {
        let url = self.endpoints.biz_health();
        self.json("biz health", self.client.get(url)).await
    }
}
