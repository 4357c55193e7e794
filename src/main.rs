use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use moodreel::catalog::{recommend_movies, RottenTomatoesCatalog};
use moodreel::config::{ConfigManager, FileConfigManager};
use moodreel::EmotionAnalyzer;

#[derive(Parser)]
#[command(name = "moodreel", about = "Reads your mood from the webcam and suggests movies for it")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the web UI (default)
    Serve {
        /// Override the configured port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Run one capture session and print the outcome as JSON
    Analyze,
    /// Print the movies suggested for an emotion as JSON
    Movies {
        /// Emotion label, e.g. happy or sad
        emotion: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config_manager = FileConfigManager::new(cli.config.clone());
    let mut config = config_manager
        .load_config()
        .await
        .map_err(|e| anyhow::anyhow!(e))
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            tracing::info!("Starting moodreel");

            let analyzer = Arc::new(EmotionAnalyzer::from_config(&config).map_err(|e| anyhow::anyhow!(e))?);
            moodreel::web::start_server(analyzer, Arc::new(config))
                .await
                .map_err(|e| anyhow::anyhow!(e))?;

            tracing::info!("moodreel stopped.");
        }
        Command::Analyze => {
            let analyzer = EmotionAnalyzer::from_config(&config).map_err(|e| anyhow::anyhow!(e))?;
            let outcome = analyzer.analyze().await.map_err(|e| anyhow::anyhow!(e))?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Movies { emotion } => {
            let catalog = RottenTomatoesCatalog::new(&config.catalog).map_err(|e| anyhow::anyhow!(e))?;
            let movies = recommend_movies(&catalog, &emotion)
                .await
                .map_err(|e| anyhow::anyhow!(e))?;
            println!("{}", serde_json::to_string_pretty(&movies)?);
        }
    }

    Ok(())
}
