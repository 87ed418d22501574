//! In-memory simulator of the vectorlane RPC service.
//!
//! Serves every RPC the client issues from an in-memory catalog and fakes
//! long-running tasks with a fixed duration. Use it over HTTP through the
//! `vectorlane-server` binary, or in-process: [`Service`] implements
//! [`vectorlane_core::Transport`], so a client can talk to it directly.

pub mod config;
pub mod error;
pub mod routes;
pub mod service;

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;

pub use config::{ConfigError, ServerConfig};
pub use error::ServiceError;
pub use service::Service;

/// Router with request tracing over `service`.
pub fn app(service: Arc<Service>) -> Router {
    routes::router(service).layer(TraceLayer::new_for_http())
}
