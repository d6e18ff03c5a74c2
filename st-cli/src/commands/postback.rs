//! Postback command - verify an inbound callback.

use console::style;

use st_api::{postback, CallbackRequest, PostbackKind, PostbackVerifier};
use st_core::config::AppConfig;
use st_core::error::{StError, StResult};

use crate::OutputFormat;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum KindArg {
    Verify,
    Optout,
    Hardbounce,
}

impl From<KindArg> for PostbackKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Verify => PostbackKind::Verify,
            KindArg::Optout => PostbackKind::Optout,
            KindArg::Hardbounce => PostbackKind::HardBounce,
        }
    }
}

/// Run the postback command. Returns whether the postback is valid.
pub async fn run(
    config: &AppConfig,
    kind: KindArg,
    params: &[String],
    format: OutputFormat,
) -> StResult<bool> {
    if config.api.api_secret.is_empty() {
        return Err(StError::MissingConfig("api.api_secret".into()));
    }
    let kind = PostbackKind::from(kind);
    let request = CallbackRequest::new(super::parse_string_pairs(params)?);

    // Optout needs only the secret; the others look up sends and blasts.
    let outcome = match kind {
        PostbackKind::Optout => postback::check_signature(kind, &request, &config.api.api_secret),
        _ => {
            let api = super::create_api_client(config)?;
            PostbackVerifier::new(&config.api.api_secret, &api)
                .check(kind, &request)
                .await
        }
    };

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "kind": kind.action(),
                "valid": outcome.is_ok(),
                "reason": outcome.as_ref().err().map(ToString::to_string),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => match &outcome {
            Ok(()) => println!("{} {kind} postback", style("valid").green().bold()),
            Err(reason) => println!("{} {kind} postback: {reason}", style("invalid").red().bold()),
        },
    }
    Ok(outcome.is_ok())
}
