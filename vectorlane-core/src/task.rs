//! Handles for long-running server-side operations.
//!
//! Loading a collection, building an index and bulk-importing files all outlive
//! the RPC that starts them. The server answers the start RPC with a task id;
//! the client wraps it in a [`TaskHandle`] and asks the server for its
//! [`TaskStatus`] until a terminal [`TaskState`] is reported.
//!
//! A handle is only a reference. The server owns the task and is the single
//! source of truth for its progress.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-assigned identifier of a task.
///
/// Treat it as opaque: the service does not promise ids are unique across
/// restarts.
pub type TaskId = i64;

/// The kind of long-running operation a handle refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Loading a collection or partition into memory.
    Load,
    /// Building an index over a field.
    IndexBuild,
    /// Importing external data files.
    BulkInsert,
}

impl TaskKind {
    /// RPC method used to query the state of a task of this kind.
    pub fn poll_method(self) -> &'static str {
        match self {
            Self::Load => "GetLoadState",
            Self::IndexBuild => "GetIndexState",
            Self::BulkInsert => "GetBulkInsertState",
        }
    }
}

/// State of a task as reported by the server.
///
/// `Pending -> InProgress -> {Completed | Failed}`. Every transition is driven
/// by the server; the client never moves a task between states on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl TaskState {
    /// Returns true for `Completed` and `Failed`.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Snapshot returned by every poll RPC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatus {
    /// Current state.
    pub state: TaskState,
    /// Completion percentage (0-100), when the server tracks it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    /// Failure reason, set when `state` is `Failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Rows processed so far (bulk insert only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_count: Option<i64>,
}

impl TaskStatus {
    /// Creates a status with only the state set.
    pub fn new(state: TaskState) -> Self {
        Self {
            state,
            progress: None,
            reason: None,
            row_count: None,
        }
    }

    /// Creates a `Failed` status with the given reason.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
            ..Self::new(TaskState::Failed)
        }
    }

    /// Sets the progress percentage. Chainable.
    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress.min(100));
        self
    }

    /// Sets the processed row count. Chainable.
    pub fn with_row_count(mut self, rows: i64) -> Self {
        self.row_count = Some(rows);
        self
    }
}

/// Payload of every RPC that starts a long-running task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSubmitted {
    pub task_id: TaskId,
}

/// Client-side reference to a server-tracked task.
///
/// Handles are cheap to clone, independent of each other, and can be polled
/// from any thread. Dropping one has no effect on the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskHandle {
    id: TaskId,
    kind: TaskKind,
    collection_name: String,
    created_at: DateTime<Utc>,
}

impl TaskHandle {
    /// Creates a handle stamped with the current time.
    ///
    /// Useful for resuming a task whose id was recorded earlier, e.g. a bulk
    /// insert started by another process.
    pub fn new(id: TaskId, kind: TaskKind, collection_name: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            collection_name: collection_name.into(),
            created_at: Utc::now(),
        }
    }

    #[inline]
    pub fn id(&self) -> TaskId {
        self.id
    }

    #[inline]
    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    /// Collection the task operates on.
    #[inline]
    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    /// When the client received the handle.
    #[inline]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} task {} on {}",
            self.kind, self.id, self.collection_name
        )
    }
}

/// Request body sent to the poll RPCs.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct TaskQuery<'a> {
    pub task_id: TaskId,
    pub collection_name: &'a str,
}

impl<'a> From<&'a TaskHandle> for TaskQuery<'a> {
    fn from(handle: &'a TaskHandle) -> Self {
        Self {
            task_id: handle.id,
            collection_name: &handle.collection_name,
        }
    }
}

/// Whether a long-running request waits for its task before returning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitMode {
    /// Poll until the task reaches a terminal state (or the wait times out).
    #[default]
    Synchronous,
    /// Return the handle right after the start RPC succeeds.
    Asynchronous,
}

/// Result of a long-running request.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    /// The task completed before the call returned.
    Completed(TaskStatus),
    /// The request was asynchronous; the task may still be running.
    Running(TaskHandle),
}

impl TaskOutcome {
    /// Returns true if the task is known to have completed.
    #[inline]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Returns the handle of a still-running task.
    pub fn handle(&self) -> Option<&TaskHandle> {
        match self {
            Self::Running(handle) => Some(handle),
            Self::Completed(_) => None,
        }
    }

    /// Consumes the outcome, returning the handle of a still-running task.
    pub fn into_handle(self) -> Option<TaskHandle> {
        match self {
            Self::Running(handle) => Some(handle),
            Self::Completed(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!TaskState::Pending.is_terminal());
        assert!(!TaskState::InProgress.is_terminal());
        assert!(TaskState::Completed.is_terminal());
        assert!(TaskState::Failed.is_terminal());
    }

    #[test]
    fn test_poll_methods() {
        assert_eq!(TaskKind::Load.poll_method(), "GetLoadState");
        assert_eq!(TaskKind::IndexBuild.poll_method(), "GetIndexState");
        assert_eq!(TaskKind::BulkInsert.poll_method(), "GetBulkInsertState");
    }

    #[test]
    fn test_status_wire_format() {
        let status: TaskStatus =
            serde_json::from_str(r#"{"state":"in_progress","progress":40}"#).unwrap();
        assert_eq!(status.state, TaskState::InProgress);
        assert_eq!(status.progress, Some(40));
        assert_eq!(status.reason, None);

        let json = serde_json::to_string(&TaskStatus::failed("bad file")).unwrap();
        assert_eq!(json, r#"{"state":"failed","reason":"bad file"}"#);
    }

    #[test]
    fn test_progress_is_clamped() {
        let status = TaskStatus::new(TaskState::InProgress).with_progress(250);
        assert_eq!(status.progress, Some(100));
    }

    #[test]
    fn test_outcome_accessors() {
        let handle = TaskHandle::new(3, TaskKind::BulkInsert, "books");
        let running = TaskOutcome::Running(handle.clone());
        assert!(!running.is_completed());
        assert_eq!(running.handle(), Some(&handle));

        let done = TaskOutcome::Completed(TaskStatus::new(TaskState::Completed));
        assert!(done.is_completed());
        assert!(done.into_handle().is_none());
    }

    #[test]
    fn test_handle_display() {
        let handle = TaskHandle::new(12, TaskKind::IndexBuild, "books");
        assert_eq!(handle.to_string(), "IndexBuild task 12 on books");
    }
}
