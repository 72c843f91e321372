mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "progeny")]
#[command(author, version, about = "Plant disease detection service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on (defaults to daemon.port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Address to bind (defaults to daemon.host)
        #[arg(long)]
        host: Option<String>,

        /// Directory holding the crop models
        #[arg(short, long)]
        models_dir: Option<PathBuf>,
    },

    /// Show which crop models load
    #[command(alias = "ls")]
    Models,

    /// Classify one image locally, without the server
    Predict {
        /// Crop type (apple, corn, potato, tomato)
        crop: String,

        /// Image file
        image: PathBuf,

        /// Number of ranked classes to print
        #[arg(short, long, default_value_t = 3)]
        top: usize,
    },

    /// Inspect a model file's inputs and outputs
    Inspect {
        /// Path to the ONNX model
        path: PathBuf,

        /// Write a JSON summary to this file
        #[arg(long)]
        json: Option<PathBuf>,

        /// Seed for the probe input
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },

    /// View or set configuration
    Config {
        /// Config key (e.g., "daemon.port", "models.directory")
        key: Option<String>,

        /// Value to set (if omitted, shows current value)
        value: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            port,
            host,
            models_dir,
        } => {
            commands::serve::execute(port, host, models_dir).await?;
        }
        Commands::Models => {
            commands::models::execute().await?;
        }
        Commands::Predict { crop, image, top } => {
            commands::predict::execute(&crop, &image, top).await?;
        }
        Commands::Inspect { path, json, seed } => {
            commands::inspect::execute(&path, json.as_deref(), seed).await?;
        }
        Commands::Config { key, value } => {
            commands::config::execute(key.as_deref(), value.as_deref()).await?;
        }
    }

    Ok(())
}
