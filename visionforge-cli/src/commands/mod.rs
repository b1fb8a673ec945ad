//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod models;
mod train;

pub use models::ModelCommands;
pub use train::TrainCommands;

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use visionforge_client::VisionForgeClient;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Training job management
    Train {
        #[command(subcommand)]
        command: TrainCommands,
    },
    /// Trained model catalog
    Models {
        #[command(subcommand)]
        command: ModelCommands,
    },
    /// Check that the server is reachable
    Health,
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Train { command } => train::handle_train_command(command, config).await,
        Commands::Models { command } => models::handle_model_command(command, config).await,
        Commands::Health => health(config).await,
    }
}

async fn health(config: &Config) -> Result<()> {
    let client = VisionForgeClient::new(&config.server_url);
    let health = client.health().await?;

    println!(
        "{} {} (version {}, {})",
        "✓".green(),
        health.status.green().bold(),
        health.version,
        health.timestamp.format("%Y-%m-%d %H:%M:%S")
    );

    Ok(())
}
