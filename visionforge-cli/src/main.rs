//! VisionForge CLI
//!
//! Command-line interface for submitting and following training jobs.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;

#[derive(Parser)]
#[command(name = "vforge")]
#[command(about = "VisionForge training CLI", long_about = None)]
struct Cli {
    /// Server URL
    #[arg(long, env = "VFORGE_SERVER_URL", default_value = "http://localhost:8000")]
    server_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        server_url: cli.server_url,
    };

    handle_command(cli.command, &config).await
}
