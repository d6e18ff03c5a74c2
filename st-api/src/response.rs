//! Response decoding and per-call response metadata.
//!
//! The API answers with a JSON object on success and an object carrying
//! `error` / `errormsg` on failure. The decoder only guarantees "valid JSON
//! object or array"; the shape beyond that is up to the caller.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use st_core::error::{StError, StResult};

use crate::transport::HttpMethod;

/// Maximum number of body bytes kept in a decode error.
const DECODE_ERROR_BODY_LIMIT: usize = 2048;

/// Parse a raw response body into a JSON object or array.
pub fn decode(body: &[u8]) -> StResult<Value> {
    let value: Value = serde_json::from_slice(body).map_err(|e| StError::Decode {
        message: e.to_string(),
        body: body_excerpt(body),
    })?;

    match value {
        Value::Object(_) | Value::Array(_) => Ok(value),
        other => Err(StError::Decode {
            message: format!("expected a JSON object or array, got {}", kind_of(&other)),
            body: body_excerpt(body),
        }),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn body_excerpt(body: &[u8]) -> String {
    let end = body.len().min(DECODE_ERROR_BODY_LIMIT);
    String::from_utf8_lossy(&body[..end]).into_owned()
}

/// Metadata about one completed exchange, returned alongside its body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseInfo {
    /// Final request URL (including query string for GET).
    pub url: String,
    /// Logical method of the call.
    pub method: HttpMethod,
    /// HTTP status code.
    pub status: u16,
    /// Content-Type header, if the server sent one.
    pub content_type: Option<String>,
    /// Wall time spent in the transport.
    #[serde(with = "duration_millis")]
    pub elapsed: Duration,
    /// Size of the raw response body in bytes.
    pub body_len: usize,
    /// Name of the transport that carried the request.
    pub transport: String,
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

/// A decoded response envelope plus its exchange metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    /// The decoded JSON body.
    pub body: Value,
    /// Metadata about the exchange.
    pub info: ResponseInfo,
}

impl ApiResponse {
    /// Whether the body is an error envelope (has an `error` key).
    pub fn is_error(&self) -> bool {
        self.body.get("error").is_some()
    }

    /// Numeric error code from an error envelope.
    pub fn error_code(&self) -> Option<i64> {
        match self.body.get("error")? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Human-readable error message from an error envelope.
    pub fn error_message(&self) -> Option<&str> {
        if !self.is_error() {
            return None;
        }
        self.body
            .get("errormsg")
            .and_then(Value::as_str)
            .or_else(|| self.body.get("error").and_then(Value::as_str))
    }

    /// Look up a top-level field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.body.get(field)
    }

    /// Look up a top-level string field.
    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// Consume the response, keeping only the body.
    pub fn into_body(self) -> Value {
        self.body
    }
}
