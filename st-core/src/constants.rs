//! Application-wide constants.

/// Application name.
pub const APP_NAME: &str = "Sailthru";

/// Application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default API endpoint base.
pub const DEFAULT_API_URI: &str = "https://api.sailthru.com";

/// Default User-Agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = "Sailthru API Rust Client";

/// Default request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Default connect timeout in milliseconds.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;

/// Wire format requested from the API. Only JSON is supported.
pub const FORMAT_JSON: &str = "json";

/// Header used to carry the real verb when DELETE is sent as GET.
pub const METHOD_OVERRIDE_HEADER: &str = "X-HTTP-Method-Override";

/// Payload field names.
pub mod fields {
    pub const API_KEY: &str = "api_key";
    pub const FORMAT: &str = "format";
    pub const JSON: &str = "json";
    pub const SIG: &str = "sig";
}

/// Postback action discriminators.
pub mod postback {
    pub const VERIFY: &str = "verify";
    pub const OPTOUT: &str = "optout";
    pub const HARDBOUNCE: &str = "hardbounce";
}
