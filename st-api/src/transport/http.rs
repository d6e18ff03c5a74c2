//! Full-featured transport backed by reqwest.

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use tracing::debug;

use st_core::constants::METHOD_OVERRIDE_HEADER;
use st_core::error::{StError, StResult};

use super::{finish, HttpMethod, RawResponse, Transport, TransportOptions};
use crate::payload::{url_with_query, Payload};

/// Transport over a pooled reqwest client. Supports TLS and multipart uploads.
#[derive(Clone)]
pub struct HttpTransport {
    inner: Client,
    user_agent: String,
    headers: Vec<(String, String)>,
}

impl HttpTransport {
    /// Create a new transport from shared options.
    pub fn new(options: TransportOptions) -> StResult<Self> {
        let inner = Client::builder()
            .timeout(options.timeout)
            .connect_timeout(options.connect_timeout)
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| StError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            inner,
            user_agent: options.user_agent,
            headers: options.headers,
        })
    }

    /// Apply the User-Agent and custom headers to a request builder.
    fn apply_headers(&self, mut builder: RequestBuilder) -> RequestBuilder {
        builder = builder.header(USER_AGENT, self.user_agent.as_str());
        for (key, value) in &self.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        builder
    }

    /// Build the multipart form for an upload.
    ///
    /// Each file is read fully before sending, so its handle is closed
    /// before any network I/O regardless of how the exchange ends.
    async fn multipart_form(payload: &Payload) -> StResult<Form> {
        let mut form = Form::new();
        for (name, value) in payload.text_fields() {
            form = form.text(name, value.to_string());
        }
        for file in payload.files() {
            let bytes = tokio::fs::read(&file.path).await?;
            debug!("attaching {} ({} bytes) as '{}'", file.path.display(), bytes.len(), file.name);
            form = form.part(file.name.clone(), Part::bytes(bytes).file_name(file.file_name()));
        }
        Ok(form)
    }

    /// Classify a reqwest error into a transport error for `url`.
    fn classify_error(url: &str, e: reqwest::Error) -> StError {
        let message = if e.is_timeout() {
            format!("request timed out: {e}")
        } else if e.is_connect() {
            format!("connection failed: {e}")
        } else {
            e.to_string()
        };
        StError::transport(url, message)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &'static str {
        "http"
    }

    fn supports_multipart(&self) -> bool {
        true
    }

    async fn send(&self, url: &str, payload: &Payload, method: HttpMethod) -> StResult<RawResponse> {
        let (target, builder) = if method.uses_query() {
            let target = url_with_query(url, &payload.urlencoded());
            let mut builder = self.inner.get(&target);
            if let Some(token) = method.override_token() {
                builder = builder.header(METHOD_OVERRIDE_HEADER, token);
            }
            (target, builder)
        } else if payload.is_file_upload() {
            let form = Self::multipart_form(payload).await?;
            (url.to_string(), self.inner.post(url).multipart(form))
        } else {
            let builder = self
                .inner
                .post(url)
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(payload.urlencoded());
            (url.to_string(), builder)
        };

        debug!("{} {} via http", method.wire_verb(), url);

        let response = self
            .apply_headers(builder)
            .send()
            .await
            .map_err(|e| Self::classify_error(&target, e))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| StError::transport(&target, format!("failed to read response body: {e}")))?;

        finish(target, status, content_type, body.to_vec())
    }
}
