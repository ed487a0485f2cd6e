//! ossgate - OpenAI-compatible HTTP gateway for the gpt-oss ChatKit API

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use ossgate::config::Config;
use ossgate::error::Result;
use ossgate::proxy::GatewayServer;

/// ossgate - Serve the gpt-oss ChatKit API behind an OpenAI-compatible endpoint
#[derive(Parser)]
#[command(name = "ossgate")]
#[command(about = "An OpenAI-compatible gateway for the gpt-oss ChatKit API")]
#[command(version)]
pub struct Cli {
    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Override the listen address (e.g. 0.0.0.0:8787)
    #[arg(long, short = 'l', global = true)]
    pub listen: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the gateway (default command)
    #[command(name = "serve")]
    Serve,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    match cli.command {
        None | Some(Command::Serve) => serve(cli.config, cli.listen).await,
    }
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,ossgate=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn serve(config_path: Option<PathBuf>, listen: Option<String>) -> Result<()> {
    tracing::info!("Starting ossgate {}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load(config_path.as_deref())?;
    if let Some(listen) = listen {
        config.server.listen_addr = listen;
    }
    config.validate()?;

    GatewayServer::new(config).serve().await?;

    tracing::info!("ossgate stopped");
    Ok(())
}
