//! Request/response observation hooks.
//!
//! Observers see metadata for every exchange. They return nothing and so
//! cannot fail or alter a request; a slow observer only delays the caller.

use st_core::error::StError;
use tracing::{debug, warn};

use crate::response::ResponseInfo;
use crate::transport::HttpMethod;

/// Metadata about an outgoing request.
#[derive(Debug, Clone, Copy)]
pub struct RequestEvent<'a> {
    pub method: HttpMethod,
    pub url: &'a str,
    pub transport: &'a str,
    /// Caller-assigned tag (e.g. "add", "update", "delete").
    pub event_type: Option<&'a str>,
    /// Serialized parameter blob.
    pub json: &'a str,
    pub file_upload: bool,
}

/// Outcome of a request, as seen by observers.
#[derive(Debug, Clone, Copy)]
pub enum ResponseEvent<'a> {
    /// The exchange completed; `body` is the raw response.
    Completed {
        info: &'a ResponseInfo,
        body: &'a [u8],
    },
    /// The exchange failed before a usable response was obtained.
    Failed {
        method: HttpMethod,
        url: &'a str,
        error: &'a StError,
    },
}

/// Receives request/response metadata.
pub trait RequestObserver: Send + Sync {
    fn on_request(&self, event: &RequestEvent<'_>);
    fn on_response(&self, event: &ResponseEvent<'_>);
}

/// Default observer: emits structured `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl RequestObserver for TracingObserver {
    fn on_request(&self, event: &RequestEvent<'_>) {
        debug!(
            method = %event.method,
            url = event.url,
            transport = event.transport,
            event_type = event.event_type.unwrap_or("-"),
            file_upload = event.file_upload,
            request = event.json,
            "{} REQUEST",
            event.method
        );
    }

    fn on_response(&self, event: &ResponseEvent<'_>) {
        match event {
            ResponseEvent::Completed { info, body } => debug!(
                method = %info.method,
                url = info.url.as_str(),
                status = info.status,
                elapsed_ms = info.elapsed.as_millis() as u64,
                response = %String::from_utf8_lossy(body),
                "{} RESPONSE",
                info.method
            ),
            ResponseEvent::Failed { method, url, error } => {
                warn!(method = %method, url = *url, "{} FAILED: {}", method, error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_tracing_observer_accepts_all_events() {
        let observer = TracingObserver;
        observer.on_request(&RequestEvent {
            method: HttpMethod::Post,
            url: "https://api.sailthru.com/send",
            transport: "http",
            event_type: Some("add"),
            json: "{}",
            file_upload: false,
        });

        let info = ResponseInfo {
            url: "https://api.sailthru.com/send".into(),
            method: HttpMethod::Post,
            status: 200,
            content_type: None,
            elapsed: Duration::from_millis(3),
            body_len: 2,
            transport: "http".into(),
        };
        observer.on_response(&ResponseEvent::Completed { info: &info, body: b"{}" });

        let error = StError::transport("https://api.sailthru.com/send", "refused");
        observer.on_response(&ResponseEvent::Failed {
            method: HttpMethod::Post,
            url: "https://api.sailthru.com/send",
            error: &error,
        });
    }
}
