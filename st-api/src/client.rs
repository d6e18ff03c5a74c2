//! Request orchestration for the Sailthru API.
//!
//! Turns an action name plus parameters into a signed payload, hands it to
//! the configured transport, and decodes the answer. Nothing is retried and
//! no state is written after construction, so a client can be shared
//! between tasks freely.

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use st_core::config::{ApiConfig, Credentials};
use st_core::error::StResult;

use crate::observer::{RequestEvent, RequestObserver, ResponseEvent, TracingObserver};
use crate::payload::{ParameterSet, Payload};
use crate::response::{self, ApiResponse, ResponseInfo};
use crate::transport::{self, HttpMethod, Transport};

/// Client for the Sailthru REST API.
///
/// Cloning is cheap: the transport and observer are shared.
#[derive(Clone)]
pub struct ApiClient {
    credentials: Credentials,
    /// Endpoint base (e.g. "https://api.sailthru.com"), no trailing slash.
    api_uri: String,
    transport: Arc<dyn Transport>,
    observer: Arc<dyn RequestObserver>,
    /// Tag forwarded to observers with every request.
    event_type: Option<String>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("credentials", &self.credentials)
            .field("api_uri", &self.api_uri)
            .field("transport", &self.transport.name())
            .field("event_type", &self.event_type)
            .finish()
    }
}

impl ApiClient {
    /// Create a client from configuration, selecting its transport.
    pub fn new(config: &ApiConfig) -> StResult<Self> {
        config.validate()?;
        let transport = transport::from_config(config)?;
        Ok(Self::with_transport(
            Credentials::from(config),
            &config.api_uri,
            transport,
        ))
    }

    /// Create a client around an explicit transport.
    pub fn with_transport(
        credentials: Credentials,
        api_uri: &str,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            credentials,
            api_uri: ApiConfig::sanitize_api_uri(api_uri),
            transport,
            observer: Arc::new(TracingObserver),
            event_type: None,
        }
    }

    /// Replace the request observer.
    pub fn with_observer(mut self, observer: Arc<dyn RequestObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Tag subsequent requests with an event type for observers.
    pub fn with_event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn api_uri(&self) -> &str {
        &self.api_uri
    }

    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }

    /// Full URL for an action.
    pub fn action_url(&self, action: &str) -> String {
        format!("{}/{}", self.api_uri, action.trim_start_matches('/'))
    }

    /// Build a signed payload with this client's credentials.
    pub fn build_payload(&self, data: ParameterSet, binary_fields: &[&str]) -> StResult<Payload> {
        Payload::build(&self.credentials, data, binary_fields)
    }

    /// POST an action. Fields named in `binary_fields` that point at
    /// existing files are uploaded as file content.
    pub async fn api_post(
        &self,
        action: &str,
        data: ParameterSet,
        binary_fields: &[&str],
    ) -> StResult<ApiResponse> {
        let payload = self.build_payload(data, binary_fields)?;
        self.execute(HttpMethod::Post, action, &payload).await
    }

    /// GET an action.
    pub async fn api_get(&self, action: &str, data: ParameterSet) -> StResult<ApiResponse> {
        let payload = self.build_payload(data, &[])?;
        self.execute(HttpMethod::Get, action, &payload).await
    }

    /// DELETE an action (sent as GET with a method override).
    pub async fn api_delete(&self, action: &str, data: ParameterSet) -> StResult<ApiResponse> {
        let payload = self.build_payload(data, &[])?;
        self.execute(HttpMethod::Delete, action, &payload).await
    }

    /// Send a prepared payload and decode the response.
    pub async fn execute(
        &self,
        method: HttpMethod,
        action: &str,
        payload: &Payload,
    ) -> StResult<ApiResponse> {
        let url = self.action_url(action);
        transport::check_upload_capability(self.transport.as_ref(), payload, method)?;

        self.observer.on_request(&RequestEvent {
            method,
            url: &url,
            transport: self.transport.name(),
            event_type: self.event_type.as_deref(),
            json: payload.json(),
            file_upload: payload.is_file_upload(),
        });

        let start = Instant::now();
        let raw = match self.transport.send(&url, payload, method).await {
            Ok(raw) => raw,
            Err(error) => {
                self.observer.on_response(&ResponseEvent::Failed {
                    method,
                    url: &url,
                    error: &error,
                });
                return Err(error);
            }
        };

        let info = ResponseInfo {
            url: raw.url,
            method,
            status: raw.status,
            content_type: raw.content_type,
            elapsed: start.elapsed(),
            body_len: raw.body.len(),
            transport: self.transport.name().to_string(),
        };
        self.observer.on_response(&ResponseEvent::Completed {
            info: &info,
            body: &raw.body,
        });

        let body = response::decode(&raw.body)?;
        debug!("{} {} -> {} in {:?}", method, action, info.status, info.elapsed);
        Ok(ApiResponse { body, info })
    }
}
