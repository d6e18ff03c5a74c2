//! Shared test utilities for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use serde_json::Value;
use wiremock::MockServer;

use st_api::{
    signature, ApiClient, CallbackRequest, ParameterSet, RequestEvent, RequestObserver,
    ResponseEvent,
};
use st_core::config::{ApiConfig, TransportKind};

pub const API_KEY: &str = "test-api-key";
pub const API_SECRET: &str = "test-api-secret";

/// Turn a `json!` object literal into a parameter set.
pub fn params(value: Value) -> ParameterSet {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// Create a client pointed at the mock server using the given transport.
pub fn client_for(server: &MockServer, transport: TransportKind) -> ApiClient {
    let mut config = ApiConfig::new(API_KEY, API_SECRET, server.uri());
    config.transport = transport;
    config.timeout_ms = 5_000;
    ApiClient::new(&config).expect("failed to build test client")
}

/// Build a postback with a correct signature under `secret`.
pub fn signed_callback(pairs: &[(&str, &str)], secret: &str) -> CallbackRequest {
    let unsigned = CallbackRequest::new(pairs.iter().copied());
    let sig = signature::sign(&unsigned.unsigned_params(), secret);
    let mut all: Vec<(String, String)> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    all.push(("sig".into(), sig));
    CallbackRequest::new(all)
}

/// Check that a received (api_key, format, json, sig) set is correctly signed.
pub fn assert_signed(pairs: &[(String, String)]) {
    let get = |name: &str| {
        pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| panic!("missing field {name}"))
    };
    let mut signed = ParameterSet::new();
    signed.insert("api_key".into(), Value::String(get("api_key")));
    signed.insert("format".into(), Value::String(get("format")));
    signed.insert("json".into(), Value::String(get("json")));
    assert_eq!(get("api_key"), API_KEY);
    assert_eq!(get("format"), "json");
    assert!(
        signature::verify_signature(&signed, API_SECRET, &get("sig")),
        "signature did not verify"
    );
}

/// Observer that records a line per event.
#[derive(Default)]
pub struct RecordingObserver {
    pub events: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn lines(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl RequestObserver for RecordingObserver {
    fn on_request(&self, event: &RequestEvent<'_>) {
        self.events.lock().unwrap().push(format!(
            "request {} {} {}",
            event.method,
            event.event_type.unwrap_or("-"),
            event.transport
        ));
    }

    fn on_response(&self, event: &ResponseEvent<'_>) {
        let line = match event {
            ResponseEvent::Completed { info, .. } => format!("response {}", info.status),
            ResponseEvent::Failed { .. } => "failed".to_string(),
        };
        self.events.lock().unwrap().push(line);
    }
}
