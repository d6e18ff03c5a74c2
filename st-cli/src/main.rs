//! Sailthru CLI - command-line access to the Sailthru API client.
//!
//! Signs parameter sets, issues signed requests through either transport,
//! and checks postbacks. Handy for scripting and for debugging signatures
//! against a live account.

mod commands;

use std::path::Path;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::info;

use st_core::config::{AppConfig, TransportKind};
use st_core::error::StResult;
use st_core::logging;

/// Sailthru - signed client for the Sailthru REST API.
#[derive(Parser)]
#[command(
    name = "sailthru",
    version,
    about = "Sailthru API client CLI",
    long_about = "A command-line interface for the Sailthru REST API.\n\
                   Signs requests with your API secret, sends them, and verifies postbacks."
)]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json).
    #[arg(short = 'f', long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Transport to use (overrides config).
    #[arg(short, long, global = true)]
    transport: Option<TransportArg>,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output for scripting.
    Json,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum TransportArg {
    Http,
    Stream,
}

impl From<TransportArg> for TransportKind {
    fn from(arg: TransportArg) -> Self {
        match arg {
            TransportArg::Http => TransportKind::Http,
            TransportArg::Stream => TransportKind::Stream,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the signature of a parameter set.
    Sign {
        /// Secret to sign with (defaults to the configured API secret).
        #[arg(short, long)]
        secret: Option<String>,
        /// Parameters as key=value pairs.
        params: Vec<String>,
    },
    /// Send a GET request for an action.
    Get {
        /// API action (e.g. "send", "blast", "user").
        action: String,
        /// Parameters as key=value pairs.
        params: Vec<String>,
    },
    /// Send a POST request for an action.
    Post {
        /// API action (e.g. "send", "job").
        action: String,
        /// Parameters as key=value pairs.
        params: Vec<String>,
        /// Parameter whose value is a local file to upload.
        #[arg(long = "file")]
        files: Vec<String>,
    },
    /// Send a DELETE request for an action.
    Delete {
        /// API action (e.g. "send").
        action: String,
        /// Parameters as key=value pairs.
        params: Vec<String>,
    },
    /// Verify an inbound postback.
    Postback {
        /// Postback kind.
        kind: commands::postback::KindArg,
        /// Postback fields as key=value pairs, including sig.
        params: Vec<String>,
    },
}

fn load_config(path: Option<&str>) -> StResult<AppConfig> {
    match path {
        Some(path) => AppConfig::load_from_file(Path::new(path)),
        None => AppConfig::load_default(),
    }
}

#[tokio::main]
async fn main() -> StResult<ExitCode> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(transport) = cli.transport {
        config.api.transport = transport.into();
    }

    // Initialize logging
    let mut log_config = config.logging.clone();
    if cli.verbose {
        log_config.level = "debug".into();
    }
    let _guard = logging::init_from_config(&log_config)?;

    info!("Sailthru CLI v{}", st_core::constants::APP_VERSION);

    // Dispatch to command handlers
    match cli.command {
        Commands::Sign { secret, params } => {
            commands::sign::run(&config, secret, &params, cli.format)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Get { action, params } => {
            commands::request::get(&config, &action, &params, cli.format).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Post { action, params, files } => {
            commands::request::post(&config, &action, &params, &files, cli.format).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Delete { action, params } => {
            commands::request::delete(&config, &action, &params, cli.format).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Postback { kind, params } => {
            let valid = commands::postback::run(&config, kind, &params, cli.format).await?;
            Ok(if valid { ExitCode::SUCCESS } else { ExitCode::from(1) })
        }
    }
}
