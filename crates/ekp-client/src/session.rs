// ABOUTME: Q&A and agent sessions driving a conversation log over the network
// ABOUTME: submit() appends optimistically and resolves in a spawned task; clear() always empties

use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::api::KnowledgeApi;
use crate::cache::{Effect, QueryCache};
use crate::conversation::Conversation;
use crate::error::{Result, SubmitError};
use crate::message::{Message, MessageId, Reply};
use crate::models::{AgentQueryRequest, AgentSessionHistory, QaRequest};
use crate::selection::DocumentSelection;

/// Shown in place of an answer when a Q&A request fails.
pub const QA_APOLOGY: &str = "抱歉，获取答案时出现错误，请稍后重试。";

/// Shown in place of an answer when an agent request fails.
pub const AGENT_APOLOGY: &str = "抱歉，发生了错误，请稍后重试。";

/// Apply a finished request to the log. Returns whether the reply was still wanted.
fn settle(log: &mut Conversation, reply_id: MessageId, outcome: Result<Reply>, apology: &str) -> bool {
    match outcome {
        Ok(reply) => log.resolve(reply_id, reply),
        Err(e) => {
            warn!(error = %e, "request failed; showing apology");
            log.fail(reply_id, apology)
        }
    }
}

#[derive(Debug, Default)]
struct QaState {
    log: Conversation,
    selection: DocumentSelection,
    selector_open: bool,
}

/// Retrieval-augmented Q&A conversation.
pub struct QaSession {
    api: Arc<dyn KnowledgeApi>,
    cache: Option<Arc<QueryCache>>,
    top_k: u32,
    state: Arc<Mutex<QaState>>,
}

impl QaSession {
    pub fn new(api: Arc<dyn KnowledgeApi>, top_k: u32) -> Self {
        Self {
            api,
            cache: None,
            top_k,
            state: Arc::new(Mutex::new(QaState::default())),
        }
    }

    /// Invalidate Q&A history in `cache` whenever an answer arrives.
    pub fn with_cache(mut self, cache: Arc<QueryCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Ask `question`, scoped to the current document selection.
    ///
    /// Appends the user message and a pending reply before returning; the
    /// returned task resolves the reply when the service answers.
    pub async fn submit(&self, question: &str) -> std::result::Result<JoinHandle<()>, SubmitError> {
        let (turn, document_ids) = {
            let mut state = self.state.lock().await;
            let turn = state.log.begin(question)?;
            (turn, state.selection.as_filter())
        };
        info!(
            reply = %turn.reply_id,
            scoped = document_ids.as_ref().map_or(0, Vec::len),
            "submitting question"
        );

        let request = QaRequest {
            question: turn.question,
            document_ids,
            top_k: Some(self.top_k),
        };
        let api = Arc::clone(&self.api);
        let state = Arc::clone(&self.state);
        let cache = self.cache.clone();
        let reply_id = turn.reply_id;

        Ok(tokio::spawn(async move {
            let outcome = api.ask(&request).await;
            let answered = outcome.is_ok();
            let outcome = outcome.map(|record| Reply::Answer {
                content: record.answer,
                sources: record.sources,
            });

            settle(&mut state.lock().await.log, reply_id, outcome, QA_APOLOGY);

            // The service keeps the record even if this log was cleared meanwhile
            if answered {
                if let Some(cache) = cache {
                    cache.apply(Effect::AnswerRecorded).await;
                }
            }
        }))
    }

    /// Empty the log and close the document selector. The selection is kept.
    pub async fn clear(&self) -> usize {
        let mut state = self.state.lock().await;
        state.selector_open = false;
        let removed = state.log.clear();
        info!(removed, "cleared q&a session");
        removed
    }

    /// Toggle `id` in the document selection. Returns whether it is now selected.
    pub async fn toggle_document(&self, id: i64) -> bool {
        self.state.lock().await.selection.toggle(id)
    }

    pub async fn selection(&self) -> DocumentSelection {
        self.state.lock().await.selection.clone()
    }

    pub async fn clear_selection(&self) {
        self.state.lock().await.selection.clear();
    }

    /// Flip document selector visibility. Returns the new state.
    pub async fn toggle_selector(&self) -> bool {
        let mut state = self.state.lock().await;
        state.selector_open = !state.selector_open;
        state.selector_open
    }

    pub async fn selector_open(&self) -> bool {
        self.state.lock().await.selector_open
    }

    pub async fn messages(&self) -> Vec<Message> {
        self.state.lock().await.log.messages().to_vec()
    }

    pub async fn is_pending(&self) -> bool {
        self.state.lock().await.log.is_pending()
    }
}

/// Tool-using agent conversation bound to a backend session id.
pub struct AgentSession {
    api: Arc<dyn KnowledgeApi>,
    session_id: String,
    log: Arc<Mutex<Conversation>>,
}

impl AgentSession {
    pub fn new(api: Arc<dyn KnowledgeApi>, session_id: impl Into<String>) -> Self {
        Self {
            api,
            session_id: session_id.into(),
            log: Arc::new(Mutex::new(Conversation::new())),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Send `question` to the agent. Same contract as [`QaSession::submit`].
    pub async fn submit(&self, question: &str) -> std::result::Result<JoinHandle<()>, SubmitError> {
        let turn = self.log.lock().await.begin(question)?;
        info!(reply = %turn.reply_id, session = %self.session_id, "submitting agent query");

        let request = AgentQueryRequest {
            question: turn.question,
            session_id: self.session_id.clone(),
        };
        let api = Arc::clone(&self.api);
        let log = Arc::clone(&self.log);
        let reply_id = turn.reply_id;

        Ok(tokio::spawn(async move {
            let outcome = api.agent_query(&request).await.map(|resp| Reply::Agent {
                content: resp.answer,
                steps: resp.steps,
                tools_used: resp.tools_used,
            });
            settle(&mut *log.lock().await, reply_id, outcome, AGENT_APOLOGY);
        }))
    }

    /// Empty the local log, then ask the service to forget the session.
    ///
    /// The remote call is best effort: a failure is logged and the local log
    /// stays empty either way.
    pub async fn clear(&self) -> usize {
        let removed = self.log.lock().await.clear();
        info!(removed, session = %self.session_id, "cleared agent session");

        if let Err(e) = self.api.clear_agent_session(&self.session_id).await {
            warn!(error = %e, session = %self.session_id, "failed to clear remote agent session");
        }
        removed
    }

    /// What the service remembers for this session.
    pub async fn remote_history(&self) -> Result<AgentSessionHistory> {
        self.api.agent_session(&self.session_id).await
    }

    pub async fn messages(&self) -> Vec<Message> {
        self.log.lock().await.messages().to_vec()
    }

    pub async fn is_pending(&self) -> bool {
        self.log.lock().await.is_pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheKey;
    use crate::message::{MessageState, Role};
    use crate::models::{AgentQueryResponse, QaRecord, QaSource};
    use crate::testing::{doc, FakeApi};
    use std::time::Duration;

    fn qa(api: &Arc<FakeApi>) -> QaSession {
        QaSession::new(api.clone(), 5)
    }

    #[tokio::test]
    async fn test_qa_submit_resolves_answer() {
        let api = Arc::new(FakeApi::with_documents(vec![]));
        api.set_qa_answer(QaRecord {
            answer: "员工每年享有五天年假".to_string(),
            sources: vec![],
            ..Default::default()
        });
        let session = qa(&api);

        let task = session.submit("公司请假制度是什么？").await.unwrap();
        task.await.unwrap();

        let requests = api.qa_requests.lock().unwrap().clone();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].question, "公司请假制度是什么？");
        assert_eq!(requests[0].document_ids, None);
        assert_eq!(requests[0].top_k, Some(5));

        let messages = session.messages().await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].content, "员工每年享有五天年假");
        assert_eq!(messages[1].state, MessageState::Resolved);
        assert_eq!(messages[1].sources, Some(vec![]));
        assert!(messages[1].tools_used.is_none());
    }

    #[tokio::test]
    async fn test_qa_submit_appends_before_response() {
        let api = Arc::new(FakeApi::with_documents(vec![]));
        let gate = api.hold("ask");
        let session = qa(&api);

        let task = session.submit("  hello  ").await.unwrap();

        let messages = session.messages().await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "hello");
        assert!(messages[1].is_pending());
        assert!(session.is_pending().await);

        gate.notify_one();
        task.await.unwrap();
        assert!(!session.is_pending().await);
    }

    #[tokio::test]
    async fn test_qa_submit_while_pending_is_noop() {
        let api = Arc::new(FakeApi::with_documents(vec![]));
        let gate = api.hold("ask");
        let session = qa(&api);

        let task = session.submit("first").await.unwrap();
        let second = session.submit("second").await;
        assert!(matches!(second, Err(SubmitError::AlreadyPending)));
        assert_eq!(session.messages().await.len(), 2);

        gate.notify_one();
        task.await.unwrap();
        assert_eq!(api.qa_requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_qa_blank_question_rejected() {
        let api = Arc::new(FakeApi::with_documents(vec![]));
        let session = qa(&api);
        assert!(matches!(
            session.submit("   ").await,
            Err(SubmitError::EmptyQuestion)
        ));
        assert!(session.messages().await.is_empty());
        assert!(api.qa_requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_qa_failure_shows_apology() {
        let api = Arc::new(FakeApi::with_documents(vec![]));
        api.fail("ask");
        let session = qa(&api);

        session.submit("q").await.unwrap().await.unwrap();

        let messages = session.messages().await;
        assert_eq!(messages[1].state, MessageState::Failed);
        assert_eq!(messages[1].content, QA_APOLOGY);
        assert!(messages[1].sources.is_none());
    }

    #[tokio::test]
    async fn test_qa_selection_scopes_question() {
        let api = Arc::new(FakeApi::with_documents(vec![doc(3, "a"), doc(7, "b")]));
        let session = qa(&api);

        assert!(session.toggle_document(7).await);
        assert!(session.toggle_document(3).await);
        session.submit("q").await.unwrap().await.unwrap();

        let requests = api.qa_requests.lock().unwrap().clone();
        assert_eq!(requests[0].document_ids, Some(vec![3, 7]));
    }

    #[tokio::test]
    async fn test_qa_sources_attached() {
        let api = Arc::new(FakeApi::with_documents(vec![]));
        let source = QaSource {
            chunk_id: Some(9),
            document_id: 3,
            document_title: "员工手册".to_string(),
            content: "年假五天".to_string(),
            relevance_score: 0.82,
        };
        api.set_qa_answer(QaRecord {
            answer: "五天".to_string(),
            sources: vec![source.clone()],
            ..Default::default()
        });
        let session = qa(&api);
        session.submit("年假几天").await.unwrap().await.unwrap();

        let messages = session.messages().await;
        assert_eq!(messages[1].sources, Some(vec![source]));
    }

    #[tokio::test]
    async fn test_qa_clear_drops_late_answer() {
        let api = Arc::new(FakeApi::with_documents(vec![]));
        let gate = api.hold("ask");
        let session = qa(&api);

        let task = session.submit("q").await.unwrap();
        assert_eq!(session.clear().await, 2);

        gate.notify_one();
        task.await.unwrap();
        assert!(session.messages().await.is_empty());
        assert!(!session.is_pending().await);
    }

    #[tokio::test]
    async fn test_qa_clear_resets_selector_keeps_selection() {
        let api = Arc::new(FakeApi::with_documents(vec![]));
        let session = qa(&api);
        session.toggle_document(4).await;
        assert!(session.toggle_selector().await);

        session.clear().await;
        assert!(!session.selector_open().await);
        assert!(session.selection().await.contains(4));
    }

    #[tokio::test]
    async fn test_qa_answer_invalidates_history() {
        let api = Arc::new(FakeApi::with_documents(vec![]));
        let cache = Arc::new(QueryCache::new(api.clone(), Duration::from_secs(30)));
        cache.qa_history().await.unwrap();
        let session = qa(&api).with_cache(cache.clone());

        session.submit("q").await.unwrap().await.unwrap();
        assert!(cache.needs_fetch(CacheKey::QaHistory).await);
    }

    #[tokio::test]
    async fn test_qa_failure_keeps_history_cached() {
        let api = Arc::new(FakeApi::with_documents(vec![]));
        api.fail("ask");
        let cache = Arc::new(QueryCache::new(api.clone(), Duration::from_secs(30)));
        cache.qa_history().await.unwrap();
        let session = qa(&api).with_cache(cache.clone());

        session.submit("q").await.unwrap().await.unwrap();
        assert!(!cache.needs_fetch(CacheKey::QaHistory).await);
    }

    #[tokio::test]
    async fn test_agent_submit_sets_tools() {
        let api = Arc::new(FakeApi::with_documents(vec![]));
        api.set_agent_answer(AgentQueryResponse {
            answer: "3".to_string(),
            steps: vec![],
            tools_used: vec!["calculator".to_string()],
            session_id: None,
        });
        let session = AgentSession::new(api.clone(), "default");

        session.submit("1+2").await.unwrap().await.unwrap();

        let requests = api.agent_requests.lock().unwrap().clone();
        assert_eq!(requests[0].question, "1+2");
        assert_eq!(requests[0].session_id, "default");

        let messages = session.messages().await;
        assert_eq!(messages[1].content, "3");
        assert_eq!(messages[1].tools_used, Some(vec!["calculator".to_string()]));
        assert!(messages[1].sources.is_none());
    }

    #[tokio::test]
    async fn test_agent_failure_shows_apology() {
        let api = Arc::new(FakeApi::with_documents(vec![]));
        api.fail("agent_query");
        let session = AgentSession::new(api.clone(), "default");

        session.submit("1+2").await.unwrap().await.unwrap();
        let messages = session.messages().await;
        assert_eq!(messages[1].state, MessageState::Failed);
        assert_eq!(messages[1].content, AGENT_APOLOGY);
    }

    #[tokio::test]
    async fn test_agent_clear_calls_backend() {
        let api = Arc::new(FakeApi::with_documents(vec![]));
        let session = AgentSession::new(api.clone(), "default");
        session.submit("hi").await.unwrap().await.unwrap();

        assert_eq!(session.clear().await, 2);
        assert!(session.messages().await.is_empty());
        assert_eq!(api.calls("clear_agent_session"), 1);
    }

    #[tokio::test]
    async fn test_agent_clear_succeeds_when_backend_fails() {
        let api = Arc::new(FakeApi::with_documents(vec![]));
        api.fail("clear_agent_session");
        let session = AgentSession::new(api.clone(), "default");
        session.submit("hi").await.unwrap().await.unwrap();

        session.clear().await;
        assert!(session.messages().await.is_empty());
        assert_eq!(api.calls("clear_agent_session"), 1);
    }

    #[tokio::test]
    async fn test_agent_clear_while_pending_allows_new_submit() {
        let api = Arc::new(FakeApi::with_documents(vec![]));
        let gate = api.hold("agent_query");
        let session = AgentSession::new(api.clone(), "default");

        let stale = session.submit("old").await.unwrap();
        session.clear().await;
        api.release("agent_query");
        let fresh = session.submit("new").await.unwrap();
        fresh.await.unwrap();

        gate.notify_one();
        stale.await.unwrap();

        let messages = session.messages().await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "new");
        assert_eq!(messages[1].content, "agent answer to new");
    }

    #[tokio::test]
    async fn test_agent_remote_history() {
        let api = Arc::new(FakeApi::with_documents(vec![]));
        let session = AgentSession::new(api.clone(), "alice");
        let history = session.remote_history().await.unwrap();
        assert_eq!(history.session_id, "alice");
        assert_eq!(session.session_id(), "alice");
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let api = Arc::new(FakeApi::with_documents(vec![]));
        let qa_session = qa(&api);
        let agent = AgentSession::new(api.clone(), "default");

        qa_session.submit("q").await.unwrap().await.unwrap();
        assert!(agent.messages().await.is_empty());
        agent.clear().await;
        assert_eq!(qa_session.messages().await.len(), 2);
    }
}
