// ABOUTME: Endpoint registry mapping backend operations to absolute URLs
// ABOUTME: Pure string construction against the configured base URLs

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Characters escaped in free-text path segments such as session ids.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// URLs for every operation the client performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    api_base: String,
    biz_base: String,
}

impl Endpoints {
    pub fn new(api_base: &str, biz_base: &str) -> Self {
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            biz_base: biz_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn biz_base(&self) -> &str {
        &self.biz_base
    }

    // Documents

    pub fn documents(&self) -> String {
        format!("{}/api/v1/documents", self.api_base)
    }

    pub fn document(&self, id: i64) -> String {
        format!("{}/api/v1/documents/{}", self.api_base, id)
    }

    // Q&A

    pub fn qa(&self) -> String {
        format!("{}/api/v1/qa", self.api_base)
    }

    pub fn qa_history(&self) -> String {
        format!("{}/api/v1/qa/history/list", self.api_base)
    }

    pub fn qa_record(&self, id: i64) -> String {
        format!("{}/api/v1/qa/{}", self.api_base, id)
    }

    // Agent

    pub fn agent_query(&self) -> String {
        format!("{}/api/v1/agent/query", self.api_base)
    }

    pub fn agent_session(&self, session_id: &str) -> String {
        format!(
            "{}/api/v1/agent/session/{}",
            self.api_base,
            utf8_percent_encode(session_id, SEGMENT)
        )
    }

    pub fn agent_tools(&self) -> String {
        format!("{}/api/v1/agent/tools", self.api_base)
    }

    // Health

    pub fn health(&self) -> String {
        format!("{}/health", self.api_base)
    }

    pub fn biz_health(&self) -> String {
        format!("{}/health", self.biz_base)
    }
}
