//! Model catalog command handlers

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use visionforge_client::VisionForgeClient;
use visionforge_core::domain::model::ModelInfo;

use crate::config::Config;

/// Model subcommands
#[derive(Subcommand)]
pub enum ModelCommands {
    /// List trained models, newest first
    List,
    /// Show one model
    Get {
        /// Model file name (e.g. cones_yolo11n_20250101_120000.pt)
        name: String,
    },
}

/// Handle model commands
pub async fn handle_model_command(command: ModelCommands, config: &Config) -> Result<()> {
    let client = VisionForgeClient::new(&config.server_url);

    match command {
        ModelCommands::List => {
            let models = client.list_models().await?;

            if models.is_empty() {
                println!("{}", "No models found.".yellow());
                return Ok(());
            }

            println!("{}", format!("Found {} model(s):", models.len()).bold());
            println!();
            for model in &models {
                println!(
                    "  {} {}  {}  {:.2} MB  {}",
                    "▸".cyan(),
                    model.name,
                    size_label(model),
                    model.file_size_mb,
                    model
                        .created_at
                        .format("%Y-%m-%d %H:%M:%S")
                        .to_string()
                        .dimmed()
                );
            }
            Ok(())
        }
        ModelCommands::Get { name } => {
            let model = client.get_model(&name).await?;

            println!("{}", "Model:".bold());
            println!("  Name:     {}", model.name.cyan());
            println!("  Path:     {}", model.path);
            println!("  Size:     {}", size_label(&model));
            println!("  File:     {:.2} MB", model.file_size_mb);
            println!(
                "  Created:  {}",
                model.created_at.format("%Y-%m-%d %H:%M:%S")
            );
            Ok(())
        }
    }
}

fn size_label(model: &ModelInfo) -> String {
    model
        .size
        .map(|size| size.to_string())
        .unwrap_or_else(|| "?".to_string())
}
