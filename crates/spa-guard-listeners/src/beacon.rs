// Copyright (c) SPA Guard Authors.
// Licensed under the MIT License.

use serde::Serialize;

/// A `BeaconSchema`-conformant payload sent to the telemetry endpoint.
///
/// Every field is optional; the struct shape itself is the validation rule
/// from §6 (unknown fields are stripped simply by not existing on this type,
/// and every present field already has its declared primitive type).
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BeaconPayload {
    pub app_name: Option<String>,
    pub event_name: Option<String>,
    pub event_message: Option<String>,
    pub error_message: Option<String>,
    pub serialized: Option<serde_json::Value>,
    pub retry_attempt: Option<u32>,
    pub retry_id: Option<String>,
    pub error_type: Option<String>,
    pub error_context: Option<String>,
    pub http_status: Option<u16>,
    pub url: Option<String>,
}

/// Abstracts `navigator.sendBeacon` so listeners can be tested without a
/// network sink, the same way [`spa_guard_retry::PageEnvironment`] abstracts
/// the rest of the browser surface.
pub trait BeaconSink: Send + Sync + std::fmt::Debug {
    /// Sends `payload`, best-effort. Implementations must not panic or block.
    fn send(&self, payload: &BeaconPayload);
}

/// Discards every beacon. The production default until a telemetry endpoint
/// is wired up out-of-band (§6 - endpoint configuration is out of scope here).
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBeaconSink;

impl BeaconSink for NullBeaconSink {
    fn send(&self, _payload: &BeaconPayload) {}
}

/// Records every beacon sent, for assertions in tests.
#[derive(Debug, Default)]
pub struct RecordingBeaconSink {
    sent: parking_lot::Mutex<Vec<BeaconPayload>>,
}

impl RecordingBeaconSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every payload sent so far, in order.
    #[must_use]
    pub fn sent(&self) -> Vec<BeaconPayload> {
        self.sent.lock().clone()
    }
}

impl BeaconSink for RecordingBeaconSink {
    fn send(&self, payload: &BeaconPayload) {
        self.sent.lock().push(payload.clone());
    }
}
