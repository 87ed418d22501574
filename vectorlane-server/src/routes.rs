//! HTTP surface of the simulator.
//!
//! `POST /rpc/{method}` takes the JSON request parameters and always answers
//! `200 OK` with a [`RawResponse`]; rejections travel in its status.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use vectorlane_core::RawResponse;

use crate::error::ServiceError;
use crate::service::Service;

/// Builds the router over a shared service.
pub fn router(service: Arc<Service>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/rpc/:method", post(rpc))
        .with_state(service)
}

async fn health() -> &'static str {
    "ok"
}

async fn rpc(
    State(service): State<Arc<Service>>,
    Path(method): Path<String>,
    body: Bytes,
) -> Json<RawResponse> {
    let body = if body.is_empty() {
        Ok(Value::Object(Default::default()))
    } else {
        serde_json::from_slice::<Value>(&body)
    };

    let response = match body {
        Ok(body) => service.dispatch(&method, body),
        Err(e) => ServiceError::illegal(format!("body is not valid JSON: {}", e)).into(),
    };
    Json(response)
}
