// ABOUTME: Append-only message log with the optimistic append / resolve-in-place lifecycle
// ABOUTME: Enforces one pending answer per log and drops replies for cleared messages

use tracing::debug;

use crate::error::SubmitError;
use crate::message::{Message, MessageId, MessageState, Reply};

/// A question accepted by [`Conversation::begin`], waiting to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    /// Trimmed question text.
    pub question: String,
    pub user_id: MessageId,
    /// Placeholder that the answer will overwrite.
    pub reply_id: MessageId,
}

/// Ordered message log of one session.
///
/// Messages are only appended, resolved in place, or removed all at once by
/// [`Conversation::clear`].
#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    pending: Option<MessageId>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a question: append the user message and an empty pending reply.
    ///
    /// Rejected without touching the log when the trimmed text is empty or an
    /// earlier reply is still pending.
    pub fn begin(&mut self, question: &str) -> Result<Turn, SubmitError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(SubmitError::EmptyQuestion);
        }
        if self.pending.is_some() {
            return Err(SubmitError::AlreadyPending);
        }

        let user = Message::user(question.to_string());
        let reply = Message::pending_assistant();
        let turn = Turn {
            question: question.to_string(),
            user_id: user.id,
            reply_id: reply.id,
        };

        self.pending = Some(reply.id);
        self.messages.push(user);
        self.messages.push(reply);
        Ok(turn)
    }

    /// Overwrite the pending reply `id` with `reply`.
    ///
    /// Returns false and changes nothing if `id` is no longer pending in this
    /// log, e.g. because the log was cleared while the request was in flight.
    pub fn resolve(&mut self, id: MessageId, reply: Reply) -> bool {
        match self.pending_mut(id) {
            Some(message) => {
                reply.apply(message);
                self.pending = None;
                true
            }
            None => {
                debug!(%id, "dropping reply for message no longer in the log");
                false
            }
        }
    }

    /// Mark the pending reply `id` as failed with a user-facing `apology`.
    ///
    /// Same orphan rule as [`Conversation::resolve`].
    pub fn fail(&mut self, id: MessageId, apology: &str) -> bool {
        match self.pending_mut(id) {
            Some(message) => {
                message.content = apology.to_string();
                message.state = MessageState::Failed;
                self.pending = None;
                true
            }
            None => {
                debug!(%id, "dropping failure for message no longer in the log");
                false
            }
        }
    }

    /// Remove every message. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.messages.len();
        self.messages.clear();
        self.pending = None;
        removed
    }

    fn pending_mut(&mut self, id: MessageId) -> Option<&mut Message> {
        if self.pending != Some(id) {
            return None;
        }
        self.messages
            .iter_mut()
            .rev()
            .find(|m| m.id == id && m.is_pending())
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Id of the reply currently awaiting an answer.
    pub fn pending(&self) -> Option<MessageId> {
        self.pending
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
