// ABOUTME: Read-through query cache keyed by typed cache keys
// ABOUTME: Shares in-flight fetches, invalidates keys after mutations, polls health probes

use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::KnowledgeApi;
use crate::error::{ClientError, Result};
use crate::models::{Document, FileUpload, HealthStatus, QaRecord, ToolList, UploadResponse};

/// Groups of server data that are fetched and invalidated together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Documents,
    QaHistory,
    Health,
    BizHealth,
    AgentTools,
}

impl CacheKey {
    pub const ALL: [CacheKey; 5] = [
        CacheKey::Documents,
        CacheKey::QaHistory,
        CacheKey::Health,
        CacheKey::BizHealth,
        CacheKey::AgentTools,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CacheKey::Documents => "documents",
            CacheKey::QaHistory => "qa-history",
            CacheKey::Health => "health",
            CacheKey::BizHealth => "biz-health",
            CacheKey::AgentTools => "agent-tools",
        }
    }

    /// Health probes expire after the poll interval even without invalidation.
    pub fn is_polled(self) -> bool {
        matches!(self, CacheKey::Health | CacheKey::BizHealth)
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Server-side changes that make cached reads out of date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    DocumentUploaded,
    DocumentDeleted,
    /// The service stored a new Q&A record.
    AnswerRecorded,
}

impl Effect {
    /// Dependency table: which keys each effect makes stale.
    pub fn invalidates(self) -> &'static [CacheKey] {
        match self {
            Effect::DocumentUploaded | Effect::DocumentDeleted => &[CacheKey::Documents],
            Effect::AnswerRecorded => &[CacheKey::QaHistory],
        }
    }
}

/// A write that goes through the cache so dependent reads refetch.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    UploadDocument(FileUpload),
    DeleteDocument(i64),
}

impl Mutation {
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::UploadDocument(_) => "upload document",
            Mutation::DeleteDocument(_) => "delete document",
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            Mutation::UploadDocument(_) => Effect::DocumentUploaded,
            Mutation::DeleteDocument(_) => Effect::DocumentDeleted,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    Uploaded(UploadResponse),
    Deleted(i64),
}

/// Last successful decoded response for a key.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    Documents(Arc<Vec<Document>>),
    QaHistory(Arc<Vec<QaRecord>>),
    Health(HealthStatus),
    AgentTools(Arc<ToolList>),
}

type InFlight = Shared<BoxFuture<'static, Result<CachedValue>>>;

#[derive(Default)]
struct Slot {
    value: Option<CachedValue>,
    fetched_at: Option<Instant>,
    stale: bool,
    /// Bumped on invalidation so fetches started earlier are not stored.
    generation: u64,
    inflight: Option<InFlight>,
}

impl Slot {
    fn fresh_value(&self, key: CacheKey, poll_interval: Duration) -> Option<CachedValue> {
        if self.stale {
            return None;
        }
        if key.is_polled() {
            let fetched_at = self.fetched_at?;
            if fetched_at.elapsed() >= poll_interval {
                return None;
            }
        }
        self.value.clone()
    }
}

/// Read-through cache over a [`KnowledgeApi`].
///
/// Holds no authoritative copy of server data: document changes only become
/// visible by refetching after invalidation.
pub struct QueryCache {
    api: Arc<dyn KnowledgeApi>,
    poll_interval: Duration,
    slots: Mutex<HashMap<CacheKey, Slot>>,
}

impl QueryCache {
    pub fn new(api: Arc<dyn KnowledgeApi>, poll_interval: Duration) -> Self {
        Self {
            api,
            poll_interval,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn api(&self) -> &Arc<dyn KnowledgeApi> {
        &self.api
    }

    /// Return the cached value for `key`, fetching when absent, stale or expired.
    ///
    /// Concurrent reads of the same key share one request.
    pub async fn read(&self, key: CacheKey) -> Result<CachedValue> {
        let (fetch, generation) = {
            let mut slots = self.slots.lock().await;
            let slot = slots.entry(key).or_default();

            if let Some(value) = slot.fresh_value(key, self.poll_interval) {
                debug!(%key, "cache hit");
                return Ok(value);
            }

            match &slot.inflight {
                Some(inflight) => {
                    debug!(%key, "joining in-flight fetch");
                    (inflight.clone(), slot.generation)
                }
                None => {
                    debug!(%key, "fetching");
                    let api = Arc::clone(&self.api);
                    let fetch = async move { fetch_key(api, key).await }.boxed().shared();
                    slot.inflight = Some(fetch.clone());
                    (fetch, slot.generation)
                }
            }
        };

        let result = fetch.await;

        let mut slots = self.slots.lock().await;
        let slot = slots.entry(key).or_default();
        if slot.generation == generation {
            slot.inflight = None;
            if let Ok(value) = &result {
                slot.value = Some(value.clone());
                slot.fetched_at = Some(Instant::now());
                slot.stale = false;
            }
        } else {
            debug!(%key, "fetch finished after invalidation; not stored");
        }
        result
    }

    /// Last successful value for `key`, even if stale. Never fetches.
    pub async fn peek(&self, key: CacheKey) -> Option<CachedValue> {
        self.slots
            .lock()
            .await
            .get(&key)
            .and_then(|slot| slot.value.clone())
    }

    /// Whether the next read of `key` will go to the network.
    pub async fn needs_fetch(&self, key: CacheKey) -> bool {
        self.slots
            .lock()
            .await
            .get(&key)
            .and_then(|slot| slot.fresh_value(key, self.poll_interval))
            .is_none()
    }

    /// Mark `keys` stale; their next read refetches.
    pub async fn invalidate(&self, keys: &[CacheKey]) {
        let mut slots = self.slots.lock().await;
        for key in keys {
            let slot = slots.entry(*key).or_default();
            slot.stale = true;
            slot.generation += 1;
            slot.inflight = None;
            debug!(%key, "invalidated");
        }
    }

    /// Invalidate whatever `effect` makes out of date.
    pub async fn apply(&self, effect: Effect) {
        self.invalidate(effect.invalidates()).await;
    }

    /// Explicit refresh: invalidate then read.
    pub async fn refresh(&self, key: CacheKey) -> Result<CachedValue> {
        self.invalidate(&[key]).await;
        self.read(key).await
    }

    /// Perform one write. On success the dependent keys are invalidated; on
    /// failure the cache is left untouched and the error returned.
    pub async fn mutate(&self, mutation: Mutation) -> Result<MutationOutcome> {
        let name = mutation.name();
        let effect = mutation.effect();

        let result = match mutation {
            Mutation::UploadDocument(file) => self
                .api
                .upload_document(file)
                .await
                .map(MutationOutcome::Uploaded),
            Mutation::DeleteDocument(id) => self
                .api
                .delete_document(id)
                .await
                .map(|()| MutationOutcome::Deleted(id)),
        };

        match result {
            Ok(outcome) => {
                info!(mutation = name, "mutation succeeded");
                self.apply(effect).await;
                Ok(outcome)
            }
            Err(e) => {
                warn!(mutation = name, error = %e, "mutation failed");
                Err(e)
            }
        }
    }

    /// Refetch `key` every poll interval until `cancel` fires or every
    /// receiver is dropped. The first fetch happens immediately.
    pub fn poll(
        self: &Arc<Self>,
        key: CacheKey,
        cancel: CancellationToken,
    ) -> watch::Receiver<Option<Result<CachedValue>>> {
        let (tx, rx) = watch::channel(None);
        let cache = Arc::clone(self);
        let period = self.poll_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let result = cache.refresh(key).await;
                        if tx.send(Some(result)).is_err() {
                            break;
                        }
                    }
                }
            }
            debug!(%key, "poller stopped");
        });

        rx
    }

    // Typed reads

    pub async fn documents(&self) -> Result<Arc<Vec<Document>>> {
        match self.read(CacheKey::Documents).await? {
            CachedValue::Documents(docs) => Ok(docs),
            other => Err(mismatch(CacheKey::Documents, &other)),
        }
    }

    pub async fn qa_history(&self) -> Result<Arc<Vec<QaRecord>>> {
        match self.read(CacheKey::QaHistory).await? {
            CachedValue::QaHistory(records) => Ok(records),
            other => Err(mismatch(CacheKey::QaHistory, &other)),
        }
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        match self.read(CacheKey::Health).await? {
            CachedValue::Health(status) => Ok(status),
            other => Err(mismatch(CacheKey::Health, &other)),
        }
    }

    pub async fn biz_health(&self) -> Result<HealthStatus> {
        match self.read(CacheKey::BizHealth).await? {
            CachedValue::Health(status) => Ok(status),
            other => Err(mismatch(CacheKey::BizHealth, &other)),
        }
    }

    pub async fn agent_tools(&self) -> Result<Arc<ToolList>> {
        match self.read(CacheKey::AgentTools).await? {
            CachedValue::AgentTools(tools) => Ok(tools),
            other => Err(mismatch(CacheKey::AgentTools, &other)),
        }
    }
}

async fn fetch_key(api: Arc<dyn KnowledgeApi>, key: CacheKey) -> Result<CachedValue> {
    match key {
        CacheKey::Documents => api
            .list_documents()
            .await
            .map(|docs| CachedValue::Documents(Arc::new(docs))),
        CacheKey::QaHistory => api
            .qa_history()
            .await
            .map(|records| CachedValue::QaHistory(Arc::new(records))),
        CacheKey::Health => api.health().await.map(CachedValue::Health),
        CacheKey::BizHealth => api.biz_health().await.map(CachedValue::Health),
        CacheKey::AgentTools => api
            .agent_tools()
            .await
            .map(|tools| CachedValue::AgentTools(Arc::new(tools))),
    }
}

fn mismatch(key: CacheKey, value: &CachedValue) -> ClientError {
    ClientError::decode(key.name(), format!("unexpected cached value {:?}", value))
}
