//! Failure kinds of backend calls and the user-facing notices they become.
//!
//! Backend implementations return [`ClientError`]; the coordinator catches
//! every error at its boundary and turns it into a [`Notice`]. A blank search
//! query or a missing upload file is not an error at all: the coordinator
//! reports it as [`Outcome::Skipped`](crate::coordinator::Outcome::Skipped).

use std::fmt;
use thiserror::Error;

/// Result type alias for backend calls.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors a backend call can settle with.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    /// The request could not be sent or the response could not be received.
    #[error("network failure: {0}")]
    NetworkFailure(String),

    /// A response arrived but does not have the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Non-success status carrying a structured `{ "error": ... }` message.
    #[error("backend rejected the request ({status}): {message}")]
    BackendRejected {
        /// HTTP status code.
        status: u16,
        /// Message from the backend, shown verbatim.
        message: String,
    },

    /// The requested document does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}

impl ClientError {
    pub fn kind(&self) -> &'static str {
        match self {
            ClientError::NetworkFailure(_) => "network_failure",
            ClientError::MalformedResponse(_) => "malformed_response",
            ClientError::BackendRejected { .. } => "backend_rejected",
            ClientError::NotFound(_) => "not_found",
        }
    }

    /// True when the backend could not be reached at all.
    pub fn is_network(&self) -> bool {
        matches!(self, ClientError::NetworkFailure(_))
    }

    /// The notice shown to the user when `operation` fails with this error.
    ///
    /// A backend-provided message is carried verbatim; every other kind gets
    /// a generic retry suggestion.
    pub fn notice(&self, operation: Operation) -> Notice {
        match self {
            ClientError::BackendRejected { message, .. } => {
                Notice::error(format!("{} failed: {}", operation.label(), message))
            }
            ClientError::NotFound(what) => {
                Notice::error(format!("{} failed: {} not found", operation.label(), what))
            }
            ClientError::NetworkFailure(_) | ClientError::MalformedResponse(_) => Notice::error(
                format!("{} failed. Please try again.", operation.label()),
            ),
        }
    }
}

/// User-triggered operations the coordinator sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Upload,
    Search,
    RefreshDocuments,
    ClassifyAll,
    RefreshStatistics,
    FetchDocument,
    HealthCheck,
}

impl Operation {
    pub fn label(self) -> &'static str {
        match self {
            Operation::Upload => "Upload",
            Operation::Search => "Search",
            Operation::RefreshDocuments => "Loading documents",
            Operation::ClassifyAll => "Classification",
            Operation::RefreshStatistics => "Loading statistics",
            Operation::FetchDocument => "Loading document",
            Operation::HealthCheck => "Health check",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A message meant for the user, queued by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
