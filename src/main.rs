// src/main.rs

use anyhow::Result;
use clap::{Parser, Subcommand};
use nupkgd::{Config, db, index, server};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nupkgd")]
#[command(author, version, about = "NuGet-v2-compatible package feed server", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the index database
    Init,
    /// Rebuild the index from the package directory and print the summary
    Rebuild,
    /// Run the HTTP server
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Init => {
            db::init(&config.db_path)?;
            info!("initialized index database at {}", config.db_path.display());
        }
        Commands::Rebuild => {
            db::init(&config.db_path)?;
            let mut conn = db::open(&config.db_path)?;
            let summary = index::rebuild(
                &mut conn,
                &config.package_directory,
                &config.base_url(),
            )?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Serve => {
            db::init(&config.db_path)?;
            server::run(config).await?;
        }
    }

    Ok(())
}
