// ABOUTME: Error types for ekp-client
// ABOUTME: Transport, status and decode failures plus session submit rejections

use thiserror::Error;

/// Errors that can occur talking to the knowledge service.
///
/// Payloads are plain strings so the error is `Clone`; one in-flight cache
/// fetch hands the same result to every reader waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("Network error during {operation}: {message}")]
    Network {
        operation: &'static str,
        message: String,
    },

    #[error("Request failed during {operation}: HTTP {status}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("Invalid response during {operation}: {message}")]
    Decode {
        operation: &'static str,
        message: String,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    pub(crate) fn network(operation: &'static str, err: impl std::fmt::Display) -> Self {
        ClientError::Network {
            operation,
            message: err.to_string(),
        }
    }

    pub(crate) fn decode(operation: &'static str, err: impl std::fmt::Display) -> Self {
        ClientError::Decode {
            operation,
            message: err.to_string(),
        }
    }

    /// HTTP status retained for diagnostics, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Name of the backend operation that failed.
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            ClientError::Network { operation, .. }
            | ClientError::Status { operation, .. }
            | ClientError::Decode { operation, .. } => Some(*operation),
            _ => None,
        }
    }
}

/// Reasons a question is not accepted by a conversational session.
///
/// A rejected submit appends nothing and sends nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("Question is empty")]
    EmptyQuestion,

    #[error("A question is already awaiting an answer")]
    AlreadyPending,
}

pub type Result<T> = std::result::Result<T, ClientError>;
