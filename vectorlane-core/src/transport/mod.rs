//! Transport seam between the client and the remote service.
//!
//! The client never talks to the network directly. It hands an [`RpcRequest`]
//! (method name plus JSON body) to a [`Transport`] and gets back a
//! [`RawResponse`] carrying the server's [`RpcStatus`] and payload. How the
//! request travels, and whether it is retried, is up to the transport.
//!
//! This module provides:
//! - [`Transport`] trait implemented by every channel
//! - [`HttpTransport`] posting JSON over HTTP (requires the `http` feature)

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::{HttpConfig, HttpTransport};

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Status code the server uses for success.
pub const SUCCESS_CODE: i32 = 0;

/// Failures below the RPC layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The service could not be reached.
    #[error("service unreachable: {0}")]
    Unreachable(String),

    /// The request could not be serialized.
    #[error("failed to encode request: {0}")]
    Encode(String),

    /// The response could not be deserialized.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The per-request deadline elapsed before a response arrived.
    #[error("deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),

    /// The channel answered with a non-success HTTP status.
    #[error("http status {status}: {body}")]
    Http { status: u16, body: String },

    /// The runtime executing the call failed (e.g. a worker panicked).
    #[error("runtime failure: {0}")]
    Runtime(String),
}

/// A single RPC ready to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcRequest {
    /// Method name, e.g. `CreateCollection`.
    pub method: &'static str,
    /// Serialized request parameters.
    pub body: Value,
    /// Per-request deadline; `None` means no limit.
    pub timeout: Option<Duration>,
}

/// Status part of every server response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcStatus {
    pub code: i32,
    #[serde(default)]
    pub reason: String,
}

impl RpcStatus {
    /// The success status.
    pub fn success() -> Self {
        Self {
            code: SUCCESS_CODE,
            reason: String::new(),
        }
    }

    /// A failure status with the given code and reason.
    pub fn error(code: i32, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }
}

/// Undecoded response of a completed RPC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawResponse {
    pub status: RpcStatus,
    #[serde(default)]
    pub payload: Value,
}

impl RawResponse {
    /// A successful response carrying `payload`.
    pub fn ok(payload: Value) -> Self {
        Self {
            status: RpcStatus::success(),
            payload,
        }
    }

    /// A successful response with no payload.
    pub fn empty() -> Self {
        Self::ok(Value::Null)
    }

    /// A failed response.
    pub fn error(code: i32, reason: impl Into<String>) -> Self {
        Self {
            status: RpcStatus::error(code, reason),
            payload: Value::Null,
        }
    }
}

/// A channel able to deliver RPCs to the service.
///
/// Implementations are shared read-only by every operation of a client, so
/// they must be `Send + Sync`. `invoke` returns `Err` only when the call could
/// not be completed; a server-side rejection is an `Ok` response with a
/// non-success [`RpcStatus`].
pub trait Transport: Send + Sync {
    fn invoke(&self, request: &RpcRequest) -> Result<RawResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn invoke(&self, request: &RpcRequest) -> Result<RawResponse, TransportError> {
        (**self).invoke(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn invoke(&self, request: &RpcRequest) -> Result<RawResponse, TransportError> {
        (**self).invoke(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Echo;

    impl Transport for Echo {
        fn invoke(&self, request: &RpcRequest) -> Result<RawResponse, TransportError> {
            Ok(RawResponse::ok(json!({ "method": request.method })))
        }
    }

    #[test]
    fn test_raw_response_defaults() {
        let response: RawResponse = serde_json::from_str(r#"{"status":{"code":0}}"#).unwrap();
        assert!(response.status.is_success());
        assert_eq!(response.payload, Value::Null);
    }

    #[test]
    fn test_rpc_status() {
        assert!(RpcStatus::success().is_success());
        let status = RpcStatus::error(4, "collection not found");
        assert!(!status.is_success());
        assert_eq!(status.reason, "collection not found");
    }

    #[test]
    fn test_shared_transport() {
        let transport: Arc<dyn Transport> = Arc::new(Echo);
        let request = RpcRequest {
            method: "HasCollection",
            body: Value::Null,
            timeout: None,
        };
        let response = transport.invoke(&request).unwrap();
        assert_eq!(response.payload, json!({ "method": "HasCollection" }));

        let boxed: Box<dyn Transport> = Box::new(Echo);
        assert!(boxed.invoke(&request).is_ok());
    }
}
