// ABOUTME: Application store owning the API handle, query cache, and both sessions
// ABOUTME: One instance per running client; views borrow from it instead of globals

use std::sync::Arc;
use tracing::info;

use crate::api::{HttpApi, KnowledgeApi};
use crate::cache::{Mutation, MutationOutcome, QueryCache};
use crate::config::ClientConfig;
use crate::endpoints::Endpoints;
use crate::error::Result;
use crate::models::FileUpload;
use crate::session::{AgentSession, QaSession};

pub struct AppStore {
    config: ClientConfig,
    cache: Arc<QueryCache>,
    qa: QaSession,
    agent: AgentSession,
}

impl AppStore {
    /// Build a store talking HTTP to the services named in `config`.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let endpoints = Endpoints::new(&config.api_url, &config.biz_url);
        info!(api = %endpoints.api_base(), biz = %endpoints.biz_base(), "connecting to knowledge platform");
        let api: Arc<dyn KnowledgeApi> = Arc::new(HttpApi::new(endpoints)?);
        Ok(Self::with_api(api, config))
    }

    /// Build a store over any [`KnowledgeApi`] implementation.
    pub fn with_api(api: Arc<dyn KnowledgeApi>, config: ClientConfig) -> Self {
        let cache = Arc::new(QueryCache::new(
            Arc::clone(&api),
            config.health_poll_interval(),
        ));
        let qa = QaSession::new(Arc::clone(&api), config.top_k).with_cache(Arc::clone(&cache));
        let agent = AgentSession::new(api, config.agent_session_id.clone());
        Self {
            config,
            cache,
            qa,
            agent,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn api(&self) -> &Arc<dyn KnowledgeApi> {
        self.cache.api()
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub fn qa(&self) -> &QaSession {
        &self.qa
    }

    pub fn agent(&self) -> &AgentSession {
        &self.agent
    }

    /// Upload a document and mark the document list stale.
    pub async fn upload(&self, file: FileUpload) -> Result<MutationOutcome> {
        self.cache.mutate(Mutation::UploadDocument(file)).await
    }

    /// Delete a document, mark the document list stale, and unselect it.
    pub async fn delete(&self, id: i64) -> Result<MutationOutcome> {
        let outcome = self.cache.mutate(Mutation::DeleteDocument(id)).await?;
        if self.qa.selection().await.contains(id) {
            self.qa.toggle_document(id).await;
        }
        Ok(outcome)
    }
}
