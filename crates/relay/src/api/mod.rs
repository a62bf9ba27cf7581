//! HTTP API for the relay

pub mod handlers;
pub mod models;
pub mod routes;

pub use handlers::RelayApiState;
pub use models::{ErrorDetail, ErrorResponse};
pub use routes::{relay_routes, DEVICE_REQUEST_PATH};
