//! CLI command implementations.

pub mod postback;
pub mod request;
pub mod sign;

use serde_json::Value;

use st_api::{ApiClient, ParameterSet};
use st_core::config::AppConfig;
use st_core::error::{StError, StResult};

/// Helper to create an API client from config.
pub fn create_api_client(config: &AppConfig) -> StResult<ApiClient> {
    ApiClient::new(&config.api).map(|client| client.with_event_type("cli"))
}

/// Parse one `key=value` argument. Values that are valid JSON are kept as
/// JSON; anything else is taken as a plain string.
pub fn parse_pair(arg: &str) -> StResult<(String, Value)> {
    let (key, raw) = arg
        .split_once('=')
        .ok_or_else(|| StError::Config(format!("expected key=value, got '{arg}'")))?;
    if key.is_empty() {
        return Err(StError::Config(format!("empty key in '{arg}'")));
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

/// Parse `key=value` arguments into a parameter set, keeping their order.
pub fn parse_params(args: &[String]) -> StResult<ParameterSet> {
    let mut params = ParameterSet::new();
    for arg in args {
        let (key, value) = parse_pair(arg)?;
        params.insert(key, value);
    }
    Ok(params)
}

/// Parse `key=value` arguments as raw strings, for postback fields.
pub fn parse_string_pairs(args: &[String]) -> StResult<Vec<(String, String)>> {
    args.iter()
        .map(|arg| {
            arg.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .ok_or_else(|| StError::Config(format!("expected key=value, got '{arg}'")))
        })
        .collect()
}

/// Truncate a string to a maximum length, appending an ellipsis if truncated.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_pair_json_or_string() {
        assert_eq!(parse_pair("count=3").unwrap(), ("count".into(), json!(3)));
        assert_eq!(parse_pair("flag=true").unwrap(), ("flag".into(), json!(true)));
        assert_eq!(
            parse_pair(r#"vars={"name":"Ann"}"#).unwrap(),
            ("vars".into(), json!({"name": "Ann"}))
        );
        assert_eq!(
            parse_pair("email=a@b.com").unwrap(),
            ("email".into(), json!("a@b.com"))
        );
        assert_eq!(parse_pair("empty=").unwrap(), ("empty".into(), json!("")));
    }

    #[test]
    fn test_parse_pair_splits_on_first_equals() {
        assert_eq!(parse_pair("q=a=b").unwrap(), ("q".into(), json!("a=b")));
    }

    #[test]
    fn test_parse_pair_rejects_bad_input() {
        assert!(parse_pair("novalue").is_err());
        assert!(parse_pair("=x").is_err());
    }

    #[test]
    fn test_parse_params_keeps_order() {
        let args = vec!["z=1".to_string(), "a=2".to_string()];
        let params = parse_params(&args).unwrap();
        let keys: Vec<&str> = params.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "a"]);
    }

    #[test]
    fn test_parse_string_pairs_keeps_raw_text() {
        let args = vec!["send_id=123".to_string()];
        assert_eq!(
            parse_string_pairs(&args).unwrap(),
            vec![("send_id".to_string(), "123".to_string())]
        );
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a long string here", 10), "a long ...");
    }
}
