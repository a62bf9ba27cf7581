//! API handlers for the device request endpoints
//!
//! The four verbs share one handler body; they differ only in the route
//! that triggers them.

use axum::extract::{Path, Request, State};
use axum::response::Response;
use std::sync::Arc;

use crate::error::{RelayError, Result};
use crate::orchestrator::DeviceRelay;
use crate::request::{remote_query, InboundRequest};

pub struct RelayApiState {
    pub relay: Arc<DeviceRelay>,
}

impl RelayApiState {
    pub fn new(relay: Arc<DeviceRelay>) -> Self {
        Self { relay }
    }
}

/// Boundary checks, then hand the call to the orchestrator
async fn send_device_request(
    state: Arc<RelayApiState>,
    device_id: String,
    request: Request,
) -> Result<Response> {
    if device_id.trim().is_empty() {
        return Err(RelayError::InvalidDeviceId);
    }
    remote_query(request.headers())?;

    state
        .relay
        .send_device_request(&device_id, InboundRequest::from_request(request))
        .await
}

/// GET /api/v1/devices/:device_id/request
pub async fn get_device_request(
    State(state): State<Arc<RelayApiState>>,
    Path(device_id): Path<String>,
    request: Request,
) -> Result<Response> {
    send_device_request(state, device_id, request).await
}

/// PUT /api/v1/devices/:device_id/request
pub async fn put_device_request(
    State(state): State<Arc<RelayApiState>>,
    Path(device_id): Path<String>,
    request: Request,
) -> Result<Response> {
    send_device_request(state, device_id, request).await
}

/// POST /api/v1/devices/:device_id/request
pub async fn post_device_request(
    State(state): State<Arc<RelayApiState>>,
    Path(device_id): Path<String>,
    request: Request,
) -> Result<Response> {
    send_device_request(state, device_id, request).await
}

/// DELETE /api/v1/devices/:device_id/request
pub async fn delete_device_request(
    State(state): State<Arc<RelayApiState>>,
    Path(device_id): Path<String>,
    request: Request,
) -> Result<Response> {
    send_device_request(state, device_id, request).await
}
