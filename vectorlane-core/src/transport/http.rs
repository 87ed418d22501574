//! JSON-over-HTTP transport.
//!
//! Each RPC is sent as `POST {endpoint}/rpc/{method}` with the request
//! parameters as the JSON body. The service answers with a [`RawResponse`]
//! document; server-side rejections travel inside it with HTTP 200.
//!
//! The transport uses reqwest's blocking client. Do not create or drop it on
//! an async runtime thread; `AsyncVectorClient` runs calls on the blocking pool.

use std::time::Duration;

use tracing::debug;

use super::{RawResponse, RpcRequest, Transport, TransportError};
use crate::error::Result;

/// Connection settings for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Base URL of the service, e.g. `http://localhost:19530`.
    pub endpoint: String,
    /// Time allowed to establish a TCP connection.
    pub connect_timeout: Duration,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
}

impl HttpConfig {
    /// Creates a config for the given endpoint with default timeouts.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            connect_timeout: Duration::from_secs(10),
            user_agent: concat!("vectorlane/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    /// Sets the connect timeout. Chainable.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the user agent. Chainable.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Blocking HTTP implementation of [`Transport`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base: String,
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Builds the underlying HTTP client.
    pub fn new(config: HttpConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent)
            .build()
            .map_err(|e| TransportError::Runtime(format!("http client init failed: {}", e)))?;

        Ok(Self {
            base: config.endpoint.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Shorthand for `HttpTransport::new(HttpConfig::new(endpoint))`.
    pub fn connect(endpoint: impl Into<String>) -> Result<Self> {
        Self::new(HttpConfig::new(endpoint))
    }

    fn url(&self, method: &str) -> String {
        format!("{}/rpc/{}", self.base, method)
    }
}

impl Transport for HttpTransport {
    fn invoke(&self, request: &RpcRequest) -> std::result::Result<RawResponse, TransportError> {
        let url = self.url(request.method);
        debug!(%url, "posting rpc");

        let mut builder = self.client.post(&url).json(&request.body);
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().map_err(|e| {
            if e.is_timeout() {
                TransportError::DeadlineExceeded(request.timeout.unwrap_or_default())
            } else {
                TransportError::Unreachable(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(TransportError::Http {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<RawResponse>()
            .map_err(|e| TransportError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_building() {
        let transport = HttpTransport::connect("http://localhost:19530/").unwrap();
        assert_eq!(
            transport.url("LoadCollection"),
            "http://localhost:19530/rpc/LoadCollection"
        );
    }

    #[test]
    fn test_config_chaining() {
        let config = HttpConfig::new("http://db:19530")
            .with_connect_timeout(Duration::from_secs(2))
            .with_user_agent("tests");
        assert_eq!(config.connect_timeout, Duration::from_secs(2));
        assert_eq!(config.user_agent, "tests");
    }

    #[test]
    fn test_unreachable_endpoint() {
        let transport = HttpTransport::new(
            HttpConfig::new("http://127.0.0.1:9").with_connect_timeout(Duration::from_millis(200)),
        )
        .unwrap();
        let request = RpcRequest {
            method: "ListCollections",
            body: serde_json::json!({}),
            timeout: Some(Duration::from_millis(500)),
        };
        let err = transport.invoke(&request).unwrap_err();
        assert!(matches!(
            err,
            TransportError::Unreachable(_) | TransportError::DeadlineExceeded(_)
        ));
    }
}
