pub mod bucket;
pub mod config;
pub mod data;
pub mod processing;
pub mod server;
pub mod types;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute sized markers for the dataset and write them as JSON
    Markers {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        /// Map zoom level the radii are scaled for
        #[arg(short, long, default_value_t = 1)]
        zoom: u8,
        /// Write to this file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Serve markers, region lookups and the overlay over HTTP
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Markers {
            config,
            zoom,
            output,
        } => {
            let app_config = config::AppConfig::load_from_file(config)?;
            let observations = data::load_observations(&app_config.input)?;

            let markers = processing::scale_markers(
                &observations,
                *zoom,
                app_config.markers.default_radius,
            )?;
            tracing::info!("Scaled {} markers at zoom {}", markers.len(), zoom);

            let json = serde_json::to_string_pretty(&markers)?;
            match output {
                Some(path) => std::fs::write(path, json)
                    .with_context(|| format!("Failed to write markers to {:?}", path))?,
                None => println!("{json}"),
            }
        }
        Commands::Serve { config } => {
            let app_config = config::AppConfig::load_from_file(config)?;

            let observations = data::load_observations(&app_config.input)?;
            let overlay = data::load_overlay(&app_config.input)?;

            server::start_server(app_config, observations, overlay).await?;
        }
    }

    Ok(())
}
