// ABOUTME: Client library for the enterprise knowledge platform
// ABOUTME: Typed API access, query caching, and the Q&A and agent conversation sessions

mod api;
mod cache;
mod config;
mod conversation;
mod endpoints;
mod error;
mod message;
mod models;
mod selection;
mod session;
mod store;

#[cfg(test)]
mod testing;

pub use api::{HttpApi, KnowledgeApi};
pub use cache::{CacheKey, CachedValue, Effect, Mutation, MutationOutcome, QueryCache};
pub use config::*;
pub use conversation::{Conversation, Turn};
pub use endpoints::Endpoints;
pub use error::{ClientError, Result, SubmitError};
pub use message::{Message, MessageId, MessageState, Reply, Role};
pub use models::*;
pub use selection::DocumentSelection;
pub use session::{AgentSession, QaSession, AGENT_APOLOGY, QA_APOLOGY};
pub use store::AppStore;
