//! Relay orchestrator
//!
//! One inbound call, strictly in order: count it, build the device request,
//! invoke the device, translate the answer, attach the device's headers and
//! release the call's telemetry. Every verb takes the same path.

use axum::response::Response;
use std::sync::Arc;
use tracing::{debug, error, info_span, warn, Instrument};

use crate::clients::blob::BlobStorage;
use crate::clients::device::DeviceTransport;
use crate::error::{RelayError, Result};
use crate::request::{DeviceRequestBuilder, InboundRequest};
use crate::telemetry::{
    instrumented, Telemetry, TelemetryScope, CREATE_REQUEST, INVOKE_REQUEST, SEND_DEVICE_REQUEST,
};
use crate::translate::{attach_headers, ResponseTranslator};
use crate::types::{BodyLimits, DeviceRequest, DeviceResponse};

/// Relays inbound HTTP calls to devices
pub struct DeviceRelay {
    transport: Arc<dyn DeviceTransport>,
    translator: ResponseTranslator,
    telemetry: Arc<dyn Telemetry>,
    builder: DeviceRequestBuilder,
}

impl DeviceRelay {
    pub fn new(
        transport: Arc<dyn DeviceTransport>,
        blob_storage: Arc<dyn BlobStorage>,
        telemetry: Arc<dyn Telemetry>,
    ) -> Self {
        Self {
            transport,
            translator: ResponseTranslator::new(blob_storage),
            telemetry,
            builder: DeviceRequestBuilder::default(),
        }
    }

    /// Use `limits` as the per-verb body ceilings
    pub fn with_limits(mut self, limits: BodyLimits) -> Self {
        self.builder = DeviceRequestBuilder::new(limits);
        self
    }

    pub fn limits(&self) -> BodyLimits {
        self.builder.limits()
    }

    /// Relay one inbound call to `device_id` and return the outbound response.
    ///
    /// Failures are returned unchanged for the HTTP boundary to map. The
    /// call's telemetry recorder is released exactly once, including when
    /// this future is dropped mid-flight.
    ///
    /// `senddevicerequest` counts every call that reaches this method. A body
    /// that declared no length and turns out larger than its verb's ceiling is
    /// only caught while `create_request` reads it, so such a call is counted
    /// and then fails with [`RelayError::PayloadTooLarge`]; bodies declaring an
    /// oversize `content-length` are refused by the router and never counted.
    pub async fn send_device_request(
        &self,
        device_id: &str,
        inbound: InboundRequest,
    ) -> Result<Response> {
        let span = info_span!("relay", device_id, method = %inbound.method);

        let result = self.relay(device_id, inbound).instrument(span.clone()).await;

        if let Err(err) = &result {
            let _entered = span.enter();
            if err.is_internal() {
                error!(error = %err, code = err.code(), "Device request failed");
            } else {
                warn!(error = %err, code = err.code(), "Device request failed");
            }
        }
        result
    }

    async fn relay(&self, device_id: &str, inbound: InboundRequest) -> Result<Response> {
        let scope = TelemetryScope::acquire(self.telemetry.as_ref());
        let recorder = scope.recorder();

        recorder.increment_counter(SEND_DEVICE_REQUEST, &[]);

        let request = instrumented(
            recorder,
            CREATE_REQUEST,
            &[],
            self.builder.build(device_id, inbound),
        )
        .await?;

        let response = instrumented(
            recorder,
            INVOKE_REQUEST,
            &[],
            self.invoke(device_id, &request),
        )
        .await?;

        let device_headers = response.headers().clone();
        let mut outbound = self.translator.translate(device_id, response, recorder).await?;
        attach_headers(&mut outbound, &device_headers);

        debug!(status = %outbound.status(), "Device request relayed");

        drop(scope);
        Ok(outbound)
    }

    /// Single device round-trip, no retries
    async fn invoke(&self, device_id: &str, request: &DeviceRequest) -> Result<DeviceResponse> {
        self.transport
            .invoke_request(device_id, request)
            .await
            .map_err(RelayError::from)
    }
}
