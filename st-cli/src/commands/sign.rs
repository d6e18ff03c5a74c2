//! Sign command - print the signature of a parameter set.

use console::style;
use serde_json::Value;
use tracing::debug;

use st_api::{signature, ParameterSet};
use st_core::config::AppConfig;
use st_core::error::{StError, StResult};

use crate::OutputFormat;

/// Build the set to sign. Values stay as the literal text given, matching
/// how postback fields arrive.
fn signing_params(args: &[String]) -> StResult<ParameterSet> {
    Ok(super::parse_string_pairs(args)?
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect())
}

/// Run the sign command.
pub fn run(
    config: &AppConfig,
    secret: Option<String>,
    params: &[String],
    format: OutputFormat,
) -> StResult<()> {
    let secret = match secret {
        Some(s) => s,
        None if !config.api.api_secret.is_empty() => config.api.api_secret.clone(),
        None => return Err(StError::MissingConfig("api.api_secret (or --secret)".into())),
    };

    let params = signing_params(params)?;
    let values = signature::signature_values(&params);
    debug!("signing {} values", values.len());
    let sig = signature::sign(&params, &secret);

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "sig": sig,
                "values": values,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => {
            println!("{} {}", style("sig").bold(), sig);
        }
    }
    Ok(())
}
