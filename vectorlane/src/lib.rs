//! # Vectorlane
//!
//! **A client SDK for remote vector database services.**
//!
//! Vectorlane issues schema, index and data requests to a vector database
//! server and waits for its long-running operations to finish:
//!
//! - **Validated requests** - Every RPC has an immutable parameter built
//!   through a builder; bad input fails before anything is sent
//! - **One result envelope** - Every call returns `Result<T>`, and failures
//!   say whether validation, the transport, the server or the task failed
//! - **Task waiting** - Loading, index builds and bulk imports block until
//!   done, or hand back a [`TaskHandle`] to poll later
//!
//! ## Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | **Builders** | `Param::builder().with_*(..).build()` for every RPC |
//! | **Error codes** | `ValidationFailed`, `TransportFailed`, `ServerRejected`, `OperationFailed`, `OperationTimedOut` |
//! | **Poller** | Interval/timeout wait loop with resumable timeouts |
//! | **HTTP transport** | JSON over HTTP (feature flag) |
//! | **Async API** | Tokio-compatible async client (feature flag) |
//!
//! ## Quick Start
//!
//! ### Building requests
//!
//! Requests can be built and checked without a server:
//!
//! ```rust
//! use std::time::Duration;
//! use vectorlane::prelude::*;
//!
//! let param = CreateIndex::builder()
//!     .with_collection_name("books")
//!     .with_field_name("embedding")
//!     .with_index_type(IndexType::IvfFlat)
//!     .with_metric_type(MetricType::L2)
//!     .with_param("nlist", "1024")
//!     .with_waiting_interval(Duration::from_millis(200))
//!     .with_waiting_timeout(Duration::from_secs(60))
//!     .build()
//!     .unwrap();
//! assert_eq!(param.index_type(), IndexType::IvfFlat);
//!
//! // A binary index with a float metric is rejected locally.
//! let err = CreateIndex::builder()
//!     .with_collection_name("books")
//!     .with_field_name("embedding")
//!     .with_index_type(IndexType::BinFlat)
//!     .with_metric_type(MetricType::L2)
//!     .build()
//!     .unwrap_err();
//! assert_eq!(err.code(), ErrorCode::ValidationFailed);
//! ```
//!
//! ### Talking to a server
//!
//! ```no_run
//! # #[cfg(feature = "http")]
//! # fn main() -> vectorlane::Result<()> {
//! use vectorlane::prelude::*;
//!
//! let client = VectorClient::connect("http://localhost:19530")?;
//!
//! let load = LoadCollection::builder().with_collection_name("books").build()?;
//! match client.load_collection(&load) {
//!     Ok(outcome) => println!("loaded: {:?}", outcome),
//!     Err(Error::OperationTimedOut { task, .. }) => {
//!         // Still running on the server; keep waiting.
//!         client.wait(&task)?;
//!     }
//!     Err(e) => return Err(e),
//! }
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "http"))]
//! # fn main() {}
//! ```
//!
//! ### Fire and forget
//!
//! ```no_run
//! # #[cfg(feature = "http")]
//! # fn main() -> vectorlane::Result<()> {
//! use vectorlane::prelude::*;
//!
//! let client = VectorClient::connect("http://localhost:19530")?;
//! let import = BulkInsert::builder()
//!     .with_collection_name("books")
//!     .add_file("books/part-0.json")
//!     .with_async(true)
//!     .build()?;
//!
//! let handle = client.bulk_insert(&import)?.into_handle();
//! if let Some(handle) = handle {
//!     let status = client.get_task_status(&handle)?;
//!     println!("{} is {:?}", handle, status.state);
//! }
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "http"))]
//! # fn main() {}
//! ```
//!
//! ## Crate Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `http` | Enables `HttpTransport` and `VectorClient::connect` |
//! | `async` | Enables `AsyncVectorClient` for tokio compatibility |
//!
//! Enable features in `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! vectorlane = { version = "0.1", features = ["http", "async"] }
//! ```
//!
//! ## Architecture
//!
//! Vectorlane is organized into three crates:
//!
//! - **`vectorlane-core`** - Requests, results, poller and client
//! - **`vectorlane`** - Main crate that re-exports everything
//! - **`vectorlane-server`** - In-memory service simulator for local development
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T>`](crate::Result), which uses
//! the [`Error`] enum. [`Error::code`] classifies a failure; [`Error::task`]
//! returns the handle of a failed or timed-out task.
//!
//! ## Thread Safety
//!
//! - [`VectorClient`] is `Clone + Send + Sync`; clones share one transport
//! - [`TaskHandle`]s are plain values and can be polled from any thread

// Re-export everything from core
pub use vectorlane_core::*;

/// JSON values used for insert columns and free-form payloads.
pub use serde_json::{json, Value};
