//! Global error types for the Sailthru client.
//!
//! All error categories are unified into a single `StError` enum with
//! conversions from underlying library errors. Inbound callback
//! authentication failures are deliberately absent: they are reported as
//! `false` by the verifier, not raised.

use thiserror::Error;

/// Convenience type alias for Results using StError.
pub type StResult<T> = Result<T, StError>;

/// Unified error type covering all error categories in the client.
#[derive(Error, Debug)]
pub enum StError {
    // -- Configuration errors --
    /// Failed to load or parse configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A required configuration value is missing.
    #[error("missing configuration: {0}")]
    MissingConfig(String),

    // -- Transport errors --
    /// Connection or stream failure talking to the API.
    #[error("transport error for {url}: {message}")]
    Transport {
        /// Target URL of the failed request.
        url: String,
        /// Underlying failure description.
        message: String,
    },

    /// The API answered with a non-2xx status.
    #[error("bad response received from {url} (status {status})")]
    HttpStatus {
        /// Target URL of the failed request.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Raw response body, for diagnostics.
        body: String,
    },

    /// The API answered with an empty body.
    #[error("no response received from {url}")]
    EmptyResponse {
        /// Target URL of the failed request.
        url: String,
    },

    /// A file upload was requested but the selected transport cannot
    /// multipart-encode it. Raised before any network I/O.
    #[error("transport '{transport}' cannot upload files (fields: {})", fields.join(", "))]
    UploadCapability {
        /// Name of the selected transport.
        transport: String,
        /// Payload fields that carry files.
        fields: Vec<String>,
    },

    // -- Decode errors --
    /// Response body is not a JSON object or array.
    #[error("response is not valid JSON: {message}")]
    Decode {
        /// Parser error description.
        message: String,
        /// Raw response body, lossily decoded.
        body: String,
    },

    // -- File/IO errors --
    /// File system operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    // -- Generic --
    /// An unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),

    /// Wrapping anyhow errors for interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StError {
    /// Build a transport error for the given URL.
    pub fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        StError::Transport {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Whether this error means "no usable answer" from the API.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            StError::Transport { .. } | StError::HttpStatus { .. } | StError::EmptyResponse { .. }
        )
    }

    /// The URL a transport-level error was raised for, if any.
    pub fn url(&self) -> Option<&str> {
        match self {
            StError::Transport { url, .. }
            | StError::HttpStatus { url, .. }
            | StError::EmptyResponse { url } => Some(url),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for StError {
    fn from(e: serde_json::Error) -> Self {
        StError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for StError {
    fn from(e: toml::de::Error) -> Self {
        StError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_st_error_display() {
        let err = StError::Config("bad value".to_string());
        assert_eq!(err.to_string(), "configuration error: bad value");
    }

    #[test]
    fn test_transport_classification() {
        let err = StError::transport("https://api.sailthru.com/send", "connection refused");
        assert!(err.is_transport());
        assert_eq!(err.url(), Some("https://api.sailthru.com/send"));

        let err = StError::EmptyResponse {
            url: "https://api.sailthru.com/blast".into(),
        };
        assert!(err.is_transport());

        let err = StError::Decode {
            message: "expected value".into(),
            body: "<html>".into(),
        };
        assert!(!err.is_transport());
        assert!(err.url().is_none());
    }

    #[test]
    fn test_upload_capability_lists_fields() {
        let err = StError::UploadCapability {
            transport: "stream".into(),
            fields: vec!["file".into(), "image".into()],
        };
        assert_eq!(
            err.to_string(),
            "transport 'stream' cannot upload files (fields: file, image)"
        );
    }
}
