// ABOUTME: Conversational message type shared by the Q&A and agent sessions
// ABOUTME: Role, lifecycle state, and the flow-specific side data of a reply

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{AgentStep, QaSource};

/// Opaque message identifier, unique for the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// Lifecycle of a message. `Resolved` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageState {
    Pending,
    Resolved,
    Failed,
}

/// A single entry in a session log.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    pub state: MessageState,
    pub created_at: DateTime<Utc>,
    /// Retrieval sources, set on resolved Q&A answers.
    pub sources: Option<Vec<QaSource>>,
    /// ReAct steps, set on resolved agent answers.
    pub reasoning_steps: Option<Vec<AgentStep>>,
    /// Tools the agent invoked, set on resolved agent answers.
    pub tools_used: Option<Vec<String>>,
}

impl Message {
    /// A user message; resolved from the moment it exists.
    pub fn user(content: String) -> Self {
        Self {
            id: MessageId::new(),
            role: Role::User,
            content,
            state: MessageState::Resolved,
            created_at: Utc::now(),
            sources: None,
            reasoning_steps: None,
            tools_used: None,
        }
    }

    /// An empty assistant placeholder awaiting its answer.
    pub fn pending_assistant() -> Self {
        Self {
            id: MessageId::new(),
            role: Role::Assistant,
            content: String::new(),
            state: MessageState::Pending,
            created_at: Utc::now(),
            sources: None,
            reasoning_steps: None,
            tools_used: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state == MessageState::Pending
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}

/// The payload that resolves a pending assistant message.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Answer {
        content: String,
        sources: Vec<QaSource>,
    },
    Agent {
        content: String,
        steps: Vec<AgentStep>,
        tools_used: Vec<String>,
    },
}

impl Reply {
    pub(crate) fn apply(self, message: &mut Message) {
        match self {
            Reply::Answer { content, sources } => {
                message.content = content;
                message.sources = Some(sources);
            }
            Reply::Agent {
                content,
                steps,
                tools_used,
            } => {
                message.content = content;
                message.reasoning_steps = Some(steps);
                message.tools_used = Some(tools_used);
            }
        }
        message.state = MessageState::Resolved;
    }
}
