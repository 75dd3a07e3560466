//! `eye` -- CLI binary for the EyeOfTerror orchestrator.
//!
//! Subcommands:
//!
//! - `eye serve` -- start the orchestrator HTTP server.
//! - `eye route` -- send a message to a running orchestrator and print
//!   the artifact bundle.
//! - `eye status` -- show the resolved configuration.

use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use clap::{Args, Parser, Subcommand};

use eye_types::{EyeConfig, InboundMessage};

/// EyeOfTerror orchestrator CLI.
#[derive(Parser)]
#[command(name = "eye", about = "EyeOfTerror plan-driven voice orchestrator", version)]
struct Cli {
    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the orchestrator HTTP server.
    Serve,

    /// Send a message to a running orchestrator and print the result.
    Route(RouteArgs),

    /// Show the resolved configuration.
    Status,
}

#[derive(Args)]
struct RouteArgs {
    /// Text payload.
    #[arg(long)]
    text: Option<String>,

    /// Audio file to send base64-encoded.
    #[arg(long)]
    audio_file: Option<PathBuf>,

    /// Base URL of the running orchestrator.
    #[arg(long, default_value = "http://127.0.0.1:1488")]
    url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    match cli.command {
        Commands::Serve => {
            let config = EyeConfig::from_env();
            eye_server::serve(&config).await?;
        }
        Commands::Route(args) => run_route(args).await?,
        Commands::Status => {
            let config = EyeConfig::from_env();
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }
    Ok(())
}

async fn run_route(args: RouteArgs) -> anyhow::Result<()> {
    let mut msg = InboundMessage::default();
    msg.text = args.text;
    if let Some(path) = &args.audio_file {
        let bytes = std::fs::read(path)?;
        msg.audio_b64 = Some(BASE64.encode(bytes));
    }
    anyhow::ensure!(msg.has_payload(), "provide --text and/or --audio-file");

    let url = format!("{}/route", args.url.trim_end_matches('/'));
    let response = reqwest::Client::new().post(url).json(&msg).send().await?;
    let status = response.status();
    let body: serde_json::Value = response.json().await?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    anyhow::ensure!(status.is_success(), "orchestrator answered {status}");
    Ok(())
}
