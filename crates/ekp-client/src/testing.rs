// ABOUTME: Scripted in-memory KnowledgeApi used by unit tests
// ABOUTME: Counts calls, injects failures, and can hold requests in flight

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use crate::api::KnowledgeApi;
use crate::error::{ClientError, Result};
use crate::models::{
    AgentQueryRequest, AgentQueryResponse, AgentSessionHistory, Document, DocumentStatus,
    FileUpload, HealthStatus, HistoryTurn, QaRecord, QaRequest, ToolInfo, ToolList,
    UploadResponse,
};

pub(crate) fn doc(id: i64, title: &str) -> Document {
    Document {
        id,
        title: title.to_string(),
        file_path: None,
        file_size: 1024,
        file_type: "pdf".to_string(),
        status: DocumentStatus::Completed,
        created_at: "2024-01-01T00:00:00".to_string(),
        updated_at: None,
    }
}

#[derive(Default)]
pub(crate) struct FakeApi {
    documents: Mutex<Vec<Document>>,
    calls: Mutex<HashMap<&'static str, usize>>,
    failing: Mutex<HashSet<&'static str>>,
    gates: Mutex<HashMap<&'static str, Arc<Notify>>>,
    called: Notify,
    pub qa_requests: Mutex<Vec<QaRequest>>,
    pub agent_requests: Mutex<Vec<AgentQueryRequest>>,
    pub qa_answer: Mutex<Option<QaRecord>>,
    pub agent_answer: Mutex<Option<AgentQueryResponse>>,
}

impl FakeApi {
    pub fn with_documents(documents: Vec<Document>) -> Self {
        Self {
            documents: Mutex::new(documents),
            ..Default::default()
        }
    }

    pub fn calls(&self, op: &str) -> usize {
        self.calls.lock().unwrap().get(op).copied().unwrap_or(0)
    }

    /// Make `op` return HTTP 500 until [`FakeApi::recover`].
    pub fn fail(&self, op: &'static str) {
        self.failing.lock().unwrap().insert(op);
    }

    pub fn recover(&self, op: &'static str) {
        self.failing.lock().unwrap().remove(op);
    }

    /// Block `op` until the returned gate is notified, once per call.
    pub fn hold(&self, op: &'static str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.lock().unwrap().insert(op, Arc::clone(&gate));
        gate
    }

    pub fn release(&self, op: &'static str) {
        self.gates.lock().unwrap().remove(op);
    }

    /// Wait until `op` has been called at least once.
    pub async fn wait_for_call(&self, op: &str) {
        loop {
            let notified = self.called.notified();
            if self.calls(op) > 0 {
                return;
            }
            notified.await;
        }
    }

    pub fn set_qa_answer(&self, record: QaRecord) {
        *self.qa_answer.lock().unwrap() = Some(record);
    }

    pub fn set_agent_answer(&self, response: AgentQueryResponse) {
        *self.agent_answer.lock().unwrap() = Some(response);
    }

    async fn enter(&self, op: &'static str) -> Result<()> {
        *self.calls.lock().unwrap().entry(op).or_insert(0) += 1;
        self.called.notify_waiters();

        let gate = self.gates.lock().unwrap().get(op).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if self.failing.lock().unwrap().contains(op) {
            return Err(ClientError::Status {
                operation: op,
                status: 500,
                body: "internal error".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl KnowledgeApi for FakeApi {
    async fn list_documents(&self) -> Result<Vec<Document>> {
        self.enter("list_documents").await?;
        Ok(self.documents.lock().unwrap().clone())
    }

    async fn get_document(&self, id: i64) -> Result<Document> {
        self.enter("get_document").await?;
        self.documents
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or(ClientError::Status {
                operation: "get_document",
                status: 404,
                body: String::new(),
            })
    }

    async fn upload_document(&self, file: FileUpload) -> Result<UploadResponse> {
        self.enter("upload_document").await?;
        let mut docs = self.documents.lock().unwrap();
        let id = docs.iter().map(|d| d.id).max().unwrap_or(0) + 1;
        let mut created = doc(id, &file.file_name);
        created.status = DocumentStatus::Pending;
        docs.push(created);
        Ok(UploadResponse {
            id,
            title: file.file_name,
            status: "pending".to_string(),
            message: "uploaded".to_string(),
        })
    }

    async fn delete_document(&self, id: i64) -> Result<()> {
        self.enter("delete_document").await?;
        self.documents.lock().unwrap().retain(|d| d.id != id);
        Ok(())
    }

    async fn ask(&self, request: &QaRequest) -> Result<QaRecord> {
        self.qa_requests.lock().unwrap().push(request.clone());
        self.enter("ask").await?;
        let answer = self.qa_answer.lock().unwrap().clone();
        Ok(answer.unwrap_or_else(|| QaRecord {
            question: request.question.clone(),
            answer: format!("answer to {}", request.question),
            ..Default::default()
        }))
    }

    async fn qa_history(&self) -> Result<Vec<QaRecord>> {
        self.enter("qa_history").await?;
        Ok(vec![])
    }

    async fn get_qa_record(&self, id: i64) -> Result<QaRecord> {
        self.enter("get_qa_record").await?;
        Ok(QaRecord {
            id,
            answer: "stored".to_string(),
            ..Default::default()
        })
    }

    async fn agent_query(&self, request: &AgentQueryRequest) -> Result<AgentQueryResponse> {
        self.agent_requests.lock().unwrap().push(request.clone());
        self.enter("agent_query").await?;
        let answer = self.agent_answer.lock().unwrap().clone();
        Ok(answer.unwrap_or_else(|| AgentQueryResponse {
            answer: format!("agent answer to {}", request.question),
            steps: vec![],
            tools_used: vec![],
            session_id: Some(request.session_id.clone()),
        }))
    }

    async fn agent_session(&self, session_id: &str) -> Result<AgentSessionHistory> {
        self.enter("agent_session").await?;
        Ok(AgentSessionHistory {
            session_id: session_id.to_string(),
            history: vec![HistoryTurn {
                role: "user".to_string(),
                content: "hello".to_string(),
            }],
        })
    }

    async fn clear_agent_session(&self, _session_id: &str) -> Result<()> {
        self.enter("clear_agent_session").await
    }

    async fn agent_tools(&self) -> Result<ToolList> {
        self.enter("agent_tools").await?;
        Ok(ToolList {
            tools: vec![ToolInfo {
                name: "calculator".to_string(),
                description: "Evaluate arithmetic".to_string(),
                parameters: serde_json::json!({"type": "object"}),
            }],
        })
    }

    async fn health(&self) -> Result<HealthStatus> {
        self.enter("health").await?;
        Ok(HealthStatus {
            status: "healthy".to_string(),
            service: Some("ekp-ai-service".to_string()),
        })
    }

    async fn biz_health(&self) -> Result<HealthStatus> {
        self.enter("biz_health").await?;
        Ok(HealthStatus {
            status: "ok".to_string(),
            service: None,
        })
    }
}
