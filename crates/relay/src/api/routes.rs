//! API routes for the relay

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;

use crate::api::handlers::*;

/// Device request route, shared by all four verbs
pub const DEVICE_REQUEST_PATH: &str = "/api/v1/devices/:device_id/request";

/// Create the relay router.
///
/// POST carries its own body ceiling; GET, PUT and DELETE share the default
/// one. Bodies declaring a larger `content-length` are refused before the
/// handler runs.
pub fn relay_routes(state: Arc<RelayApiState>) -> Router {
    let limits = state.relay.limits();

    Router::new()
        .route(
            DEVICE_REQUEST_PATH,
            get(get_device_request)
                .put(put_device_request)
                .delete(delete_device_request)
                .layer(RequestBodyLimitLayer::new(limits.default_bytes)),
        )
        .route(
            DEVICE_REQUEST_PATH,
            post(post_device_request).layer(RequestBodyLimitLayer::new(limits.post_bytes)),
        )
        .with_state(state)
}
