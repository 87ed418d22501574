//! In-band RPC errors.
//!
//! The service never answers an RPC with an HTTP error. Failures travel in the
//! response's status with a stable non-zero code.

use thiserror::Error;
use vectorlane_core::{RawResponse, TaskId};

pub const UNEXPECTED_ERROR: i32 = 1;
pub const COLLECTION_NOT_EXISTS: i32 = 4;
pub const ILLEGAL_ARGUMENT: i32 = 5;
pub const ALREADY_EXISTS: i32 = 11;
pub const INDEX_NOT_EXIST: i32 = 25;
pub const PARTITION_NOT_EXIST: i32 = 26;
pub const ALIAS_NOT_EXIST: i32 = 27;
pub const TASK_NOT_EXIST: i32 = 28;

/// Reasons the service rejects a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("unexpected error: {0}")]
    Unexpected(String),

    #[error("unknown method {0}")]
    UnknownMethod(String),

    #[error("collection {0} does not exist")]
    CollectionNotExists(String),

    #[error("illegal argument: {0}")]
    IllegalArgument(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("index {0} does not exist")]
    IndexNotExist(String),

    #[error("partition {0} does not exist")]
    PartitionNotExist(String),

    #[error("alias {0} does not exist")]
    AliasNotExist(String),

    #[error("task {0} does not exist")]
    TaskNotExist(TaskId),
}

impl ServiceError {
    /// Status code sent to the client.
    pub fn code(&self) -> i32 {
        match self {
            Self::Unexpected(_) | Self::UnknownMethod(_) => UNEXPECTED_ERROR,
            Self::CollectionNotExists(_) => COLLECTION_NOT_EXISTS,
            Self::IllegalArgument(_) => ILLEGAL_ARGUMENT,
            Self::AlreadyExists(_) => ALREADY_EXISTS,
            Self::IndexNotExist(_) => INDEX_NOT_EXIST,
            Self::PartitionNotExist(_) => PARTITION_NOT_EXIST,
            Self::AliasNotExist(_) => ALIAS_NOT_EXIST,
            Self::TaskNotExist(_) => TASK_NOT_EXIST,
        }
    }

    pub fn illegal(reason: impl Into<String>) -> Self {
        Self::IllegalArgument(reason.into())
    }
}

impl From<ServiceError> for RawResponse {
    fn from(err: ServiceError) -> Self {
        RawResponse::error(err.code(), err.to_string())
    }
}
