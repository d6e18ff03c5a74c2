//! Request commands - issue signed GET, POST and DELETE calls.

use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use console::style;

use st_api::ApiResponse;
use st_core::config::AppConfig;
use st_core::error::StResult;

use crate::OutputFormat;

/// Run `get <action>`.
pub async fn get(
    config: &AppConfig,
    action: &str,
    params: &[String],
    format: OutputFormat,
) -> StResult<()> {
    let api = super::create_api_client(config)?;
    let data = super::parse_params(params)?;
    let response = api.api_get(action, data).await?;
    print_response(&response, format)
}

/// Run `post <action>`, uploading the parameters named by `files`.
pub async fn post(
    config: &AppConfig,
    action: &str,
    params: &[String],
    files: &[String],
    format: OutputFormat,
) -> StResult<()> {
    let api = super::create_api_client(config)?;
    let data = super::parse_params(params)?;
    let binary_fields: Vec<&str> = files.iter().map(String::as_str).collect();
    let response = api.api_post(action, data, &binary_fields).await?;
    print_response(&response, format)
}

/// Run `delete <action>`.
pub async fn delete(
    config: &AppConfig,
    action: &str,
    params: &[String],
    format: OutputFormat,
) -> StResult<()> {
    let api = super::create_api_client(config)?;
    let data = super::parse_params(params)?;
    let response = api.api_delete(action, data).await?;
    print_response(&response, format)
}

fn print_response(response: &ApiResponse, format: OutputFormat) -> StResult<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(response)?);
        }
        OutputFormat::Text => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .apply_modifier(UTF8_ROUND_CORNERS)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["Method", "Status", "Transport", "Time", "Bytes", "URL"]);

            let info = &response.info;
            table.add_row(vec![
                info.method.to_string(),
                info.status.to_string(),
                info.transport.clone(),
                format!("{} ms", info.elapsed.as_millis()),
                info.body_len.to_string(),
                super::truncate(&info.url, 60),
            ]);
            println!("{table}");

            if response.is_error() {
                println!(
                    "{} {} (code {})",
                    style("ERROR").red().bold(),
                    response.error_message().unwrap_or("unknown error"),
                    response
                        .error_code()
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| "-".into()),
                );
            }
            println!("{}", serde_json::to_string_pretty(&response.body)?);
        }
    }
    Ok(())
}
