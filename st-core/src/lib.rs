//! Sailthru Core - Foundation types, error handling, configuration, and logging.
//!
//! This crate provides the shared foundation used by the other Sailthru crates:
//! - API configuration (credentials, endpoint, transport selection)
//! - A unified error type covering transport, decode, and upload failures
//! - Structured logging with tracing
//! - Platform directory lookup and common constants

pub mod config;
pub mod error;
pub mod logging;
pub mod platform;
pub mod constants;

// Re-export commonly used items at the crate root
pub use config::{ApiConfig, AppConfig, Credentials, TransportKind};
pub use error::{StError, StResult};
pub use logging::init_logging;
pub use platform::Platform;
