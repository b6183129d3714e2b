// ABOUTME: Wire models for the knowledge service HTTP API
// ABOUTME: Documents, Q&A records and sources, agent steps, tools and health

use serde::{Deserialize, Serialize};

/// Processing state of an ingested document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl DocumentStatus {
    /// Whether ingestion has finished, successfully or not.
    pub fn is_terminal(self) -> bool {
        matches!(self, DocumentStatus::Completed | DocumentStatus::Failed)
    }

    pub fn label(self) -> &'static str {
        match self {
            DocumentStatus::Pending => "pending",
            DocumentStatus::Processing => "processing",
            DocumentStatus::Completed => "completed",
            DocumentStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A document owned by the knowledge service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub file_type: String,
    pub status: DocumentStatus,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Document {
    /// File size rendered for people, e.g. `1.5 MB`.
    pub fn display_size(&self) -> String {
        format_size(self.file_size)
    }
}

/// Render a byte count using binary units.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}

/// Reply to a document upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub id: i64,
    pub title: String,
    pub status: String,
    #[serde(default)]
    pub message: String,
}

/// A retrieved excerpt backing an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_id: Option<i64>,
    pub document_id: i64,
    pub document_title: String,
    /// Excerpt of the chunk that matched.
    pub content: String,
    /// Normalized match score in `[0, 1]`.
    pub relevance_score: f64,
}

impl QaSource {
    /// Relevance as a whole percentage, clamped to `0..=100`.
    pub fn relevance_percent(&self) -> u8 {
        (self.relevance_score.clamp(0.0, 1.0) * 100.0).round() as u8
    }
}

/// Body of `POST /api/v1/qa`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaRequest {
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_ids: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
}

/// One answered question, as returned by ask and by history.
///
/// Only `answer` is required; the rest default when the service omits them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QaRecord {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<QaSource>,
    #[serde(default)]
    pub model_used: String,
    #[serde(default)]
    pub tokens_used: u64,
    #[serde(default)]
    pub response_time_ms: u64,
    #[serde(default)]
    pub created_at: String,
}

/// Body of `POST /api/v1/agent/query`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentQueryRequest {
    pub question: String,
    pub session_id: String,
}

/// One ReAct iteration reported by the agent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AgentStep {
    #[serde(default)]
    pub thought: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub action_input: serde_json::Value,
    #[serde(default)]
    pub observation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentQueryResponse {
    pub answer: String,
    #[serde(default)]
    pub steps: Vec<AgentStep>,
    #[serde(default)]
    pub tools_used: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// A prior exchange remembered by the agent for a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryTurn {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSessionHistory {
    pub session_id: String,
    #[serde(default)]
    pub history: Vec<HistoryTurn>,
}

/// A tool the agent can call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolList {
    #[serde(default)]
    pub tools: Vec<ToolInfo>,
}

/// Liveness report from `/health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy") || self.status.eq_ignore_ascii_case("ok")
    }
}

/// A file to send to the documents endpoint as the multipart `file` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime_type: Option<String>,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
            mime_type: None,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}
