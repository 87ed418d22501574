//! # Vectorlane Core
//!
//! Core library for Vectorlane, a client for remote vector database services.
//!
//! This crate holds everything between an application and the wire: validated
//! request parameters, the result envelope, task handles and the poller that
//! waits on long-running server operations.
//!
//! ## Crate Features
//!
//! - `http` - Enables [`HttpTransport`](transport::HttpTransport) and [`VectorClient::connect`]
//! - `async` - Enables [`AsyncVectorClient`] for tokio-compatible async operations
//!
//! ## Core Types
//!
//! ### Requests
//!
//! - [`param`] - One immutable parameter type per RPC, built via `builder()`
//! - [`CollectionSchema`] / [`FieldType`] - Collection layout
//!
//! ### Results
//!
//! - [`Result`] / [`Error`] - Every operation returns exactly one of a typed
//!   payload or a classified failure ([`ErrorCode`])
//! - [`TaskOutcome`] - Completed status, or a [`TaskHandle`] for async requests
//!
//! ### Long-running operations
//!
//! - [`Poller`] - Interval/timeout wait loop over a task's state RPC
//! - [`WaitPolicy`] - Poll interval and optional deadline
//! - [`Clock`] - Time source; [`ManualClock`] makes waits deterministic
//!
//! ### Client
//!
//! - [`VectorClient`] - Blocking client over any [`Transport`](transport::Transport)

pub mod client;
pub mod error;
pub mod param;
pub mod poller;
pub mod response;
pub mod schema;
pub mod task;
pub mod transport;
pub mod validation;

// Re-exports for convenient access
#[cfg(feature = "async")]
pub use client::AsyncVectorClient;
pub use client::{ClientConfig, VectorClient};
pub use error::{Error, ErrorCode, Result};
pub use poller::{Clock, ManualClock, Poller, SystemClock, WaitPolicy, DEFAULT_WAITING_INTERVAL};
pub use response::{
    AliasDescription, BulkInsertState, CollectionDescription, FlushResult, IndexDescription,
    MutationResult, PartitionDescription, Statistics,
};
pub use schema::{CollectionSchema, ConsistencyLevel, DataType, FieldType, IndexType, MetricType};
pub use task::{TaskHandle, TaskId, TaskKind, TaskOutcome, TaskState, TaskStatus, WaitMode};
pub use transport::{RawResponse, RpcRequest, RpcStatus, Transport, TransportError};

/// Re-export commonly used types for convenience.
///
/// # Example
///
/// ```rust
/// use vectorlane_core::prelude::*;
///
/// let param = LoadCollection::builder()
///     .with_collection_name("books")
///     .with_async(true)
///     .build()
///     .unwrap();
/// assert_eq!(param.wait_mode(), WaitMode::Asynchronous);
/// ```
pub mod prelude {
    #[cfg(feature = "async")]
    pub use crate::AsyncVectorClient;
    pub use crate::param::*;
    pub use crate::{
        ClientConfig, CollectionSchema, ConsistencyLevel, DataType, Error, ErrorCode, FieldType,
        IndexType, MetricType, Result, TaskHandle, TaskOutcome, TaskState, TaskStatus,
        Transport, VectorClient, WaitMode, WaitPolicy,
    };
}
