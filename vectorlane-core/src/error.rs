//! Error types for vectorlane operations.
//!
//! Every public client operation returns [`Result<T>`]. The `Ok` arm carries the
//! typed payload; the `Err` arm carries an [`Error`] whose [`ErrorCode`] tells
//! the caller which stage failed: local validation, the transport, the server,
//! or a long-running task.

use std::time::Duration;

use thiserror::Error;

use crate::task::{TaskHandle, TaskState};
use crate::transport::TransportError;

/// Result type alias using vectorlane's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Malformed or out-of-range input; the transport was never invoked.
    ValidationFailed,
    /// Connectivity, serialization or runtime failure below the RPC layer.
    TransportFailed,
    /// The server executed the request and returned a non-success status.
    ServerRejected,
    /// A long-running task reached the `Failed` state.
    OperationFailed,
    /// The client stopped waiting before a terminal state was observed.
    OperationTimedOut,
}

/// Errors that can occur during vectorlane operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A builder field failed validation in `build()`.
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    /// The request could not be delivered or its response could not be read.
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    /// The server answered with a non-success status.
    #[error("server rejected request (code {code}): {reason}")]
    ServerRejected { code: i32, reason: String },

    /// The task finished in the `Failed` state.
    #[error("task {} ({:?}) failed: {reason}", .task.id(), .task.kind())]
    OperationFailed { task: TaskHandle, reason: String },

    /// No terminal state was observed before the wait deadline.
    ///
    /// The task may still be running on the server; pass `task` back to
    /// `wait_for_completion` to resume with a fresh deadline.
    #[error("gave up on task {} after {elapsed:?} (last state {last_state:?})", .task.id())]
    OperationTimedOut {
        task: TaskHandle,
        elapsed: Duration,
        last_state: TaskState,
    },
}

impl Error {
    /// Creates a validation error for the named field.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Returns the classification of this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { .. } => ErrorCode::ValidationFailed,
            Self::Transport(_) => ErrorCode::TransportFailed,
            Self::ServerRejected { .. } => ErrorCode::ServerRejected,
            Self::OperationFailed { .. } => ErrorCode::OperationFailed,
            Self::OperationTimedOut { .. } => ErrorCode::OperationTimedOut,
        }
    }

    /// Returns the task handle for task-related failures.
    pub fn task(&self) -> Option<&TaskHandle> {
        match self {
            Self::OperationFailed { task, .. } | Self::OperationTimedOut { task, .. } => Some(task),
            _ => None,
        }
    }

    /// Returns the offending field name for validation failures.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            _ => None,
        }
    }

    /// Returns true if this error was raised before any network interaction.
    #[inline]
    pub fn is_validation(&self) -> bool {
        self.code() == ErrorCode::ValidationFailed
    }

    /// Returns true if the client gave up waiting on a task that may still finish.
    #[inline]
    pub fn is_timeout(&self) -> bool {
        self.code() == ErrorCode::OperationTimedOut
    }
}
