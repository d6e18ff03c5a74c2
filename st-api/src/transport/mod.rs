//! Transport strategies for delivering signed payloads.
//!
//! Two interchangeable implementations sit behind [`Transport`]:
//! - [`HttpTransport`]: reqwest-based, TLS and multipart uploads
//! - [`StreamTransport`]: plain HTTP/1.0 over a TCP stream, no uploads
//!
//! The strategy is picked once from configuration. Neither retries; a
//! failed exchange surfaces to the caller as a transport error carrying the
//! target URL.

mod http;
mod stream;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use st_core::config::{ApiConfig, TransportKind};
use st_core::error::{StError, StResult};

use crate::payload::Payload;

pub use http::HttpTransport;
pub use stream::StreamTransport;

/// Logical request method.
///
/// `Delete` never reaches the wire as a DELETE verb: it is sent as GET with
/// a method-override header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// The verb actually written on the wire.
    pub fn wire_verb(&self) -> &'static str {
        match self {
            HttpMethod::Post => "POST",
            HttpMethod::Get | HttpMethod::Delete => "GET",
        }
    }

    /// Value for the method-override header, if one is needed.
    pub fn override_token(&self) -> Option<&'static str> {
        match self {
            HttpMethod::Delete => Some("DELETE"),
            _ => None,
        }
    }

    /// Whether the payload travels in the query string.
    pub fn uses_query(&self) -> bool {
        !matches!(self, HttpMethod::Post)
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A successful raw exchange: 2xx status and a non-empty body.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// Final request URL.
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Shared knobs for both strategies.
#[derive(Debug, Clone)]
pub struct TransportOptions {
    /// Whole-request timeout.
    pub timeout: Duration,
    /// Connect timeout.
    pub connect_timeout: Duration,
    /// User-Agent header value.
    pub user_agent: String,
    /// Extra headers sent with every request.
    pub headers: Vec<(String, String)>,
}

impl TransportOptions {
    pub fn from_config(config: &ApiConfig) -> Self {
        let mut headers: Vec<(String, String)> = config
            .custom_headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        headers.sort();
        Self {
            timeout: Duration::from_millis(config.timeout_ms),
            connect_timeout: Duration::from_millis(config.connect_timeout_ms),
            user_agent: config.user_agent.clone(),
            headers,
        }
    }
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self::from_config(&ApiConfig::default())
    }
}

/// Sends a payload to an endpoint and returns the raw body.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Whether this transport can multipart-encode file uploads.
    fn supports_multipart(&self) -> bool;

    /// Send `payload` to `url`.
    ///
    /// Fails with a transport error on connection failure, non-2xx status,
    /// or an empty body.
    async fn send(&self, url: &str, payload: &Payload, method: HttpMethod)
        -> StResult<RawResponse>;
}

/// Build the transport selected in `config`.
pub fn from_config(config: &ApiConfig) -> StResult<Arc<dyn Transport>> {
    let options = TransportOptions::from_config(config);
    let transport: Arc<dyn Transport> = match config.transport {
        TransportKind::Http => Arc::new(HttpTransport::new(options)?),
        TransportKind::Stream => Arc::new(StreamTransport::new(options)),
    };
    Ok(transport)
}

/// Reject uploads on transports that cannot carry them, before any I/O.
pub fn check_upload_capability(
    transport: &dyn Transport,
    payload: &Payload,
    method: HttpMethod,
) -> StResult<()> {
    if payload.is_file_upload() && (method != HttpMethod::Post || !transport.supports_multipart()) {
        return Err(StError::UploadCapability {
            transport: transport.name().to_string(),
            fields: payload.file_field_names(),
        });
    }
    Ok(())
}

/// Apply the success rules shared by both strategies.
pub(crate) fn finish(
    url: String,
    status: u16,
    content_type: Option<String>,
    body: Vec<u8>,
) -> StResult<RawResponse> {
    if !(200..300).contains(&status) {
        return Err(StError::HttpStatus {
            url,
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(StError::EmptyResponse { url });
    }
    Ok(RawResponse {
        url,
        status,
        content_type,
        body,
    })
}
