//! Sailthru API - signed HTTP client for the Sailthru REST API.
//!
//! This crate builds shared-secret signed requests, delivers them through
//! one of two transports (a reqwest client with multipart uploads, or a
//! plain-stream fallback), decodes the JSON answer, and verifies inbound
//! postbacks with the same signature scheme.

pub mod client;
pub mod endpoints;
pub mod observer;
pub mod payload;
pub mod postback;
pub mod response;
pub mod signature;
pub mod transport;

// Re-export key types
pub use client::ApiClient;
pub use observer::{RequestEvent, RequestObserver, ResponseEvent, TracingObserver};
pub use payload::{FileField, ParameterSet, Payload};
pub use postback::{CallbackRequest, PostbackKind, PostbackVerifier, Rejection, ResourceLookup};
pub use response::{ApiResponse, ResponseInfo};
pub use transport::{HttpMethod, HttpTransport, StreamTransport, Transport, TransportOptions};
