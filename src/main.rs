use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use levelmap::ContentType;

mod cli;

#[derive(Parser)]
#[command(name = "levelmap")]
#[command(about = "Resolve puzzle levels to stages and sync level catalogs")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to ~/.levelmap/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a level against a catalog file
    Resolve {
        /// Catalog JSON file
        #[arg(long)]
        catalog: PathBuf,

        /// Global level number
        #[arg(long)]
        level: u32,
    },

    /// Boot all tracks and print one level of a track
    Level {
        /// Track: main, special or daily
        #[arg(long, default_value = "main")]
        track: ContentType,

        /// Level to serve (defaults to the track's saved progress)
        #[arg(long)]
        level: Option<u32>,
    },

    /// Boot all tracks, then sync catalogs announced by a remote config file
    Sync {
        /// Remote config JSON document
        #[arg(long)]
        remote: PathBuf,
    },

    /// Write a default config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    match cli.command {
        Commands::Resolve { catalog, level } => {
            cli::resolve::resolve_command(&catalog, level)?;
        }
        Commands::Level { track, level } => {
            cli::level::level_command(cli.config.as_deref(), track, level).await?;
        }
        Commands::Sync { remote } => {
            cli::sync::sync_command(cli.config.as_deref(), &remote).await?;
        }
        Commands::Init { force } => {
            cli::init::init_command(cli.config, force)?;
        }
    }

    Ok(())
}
