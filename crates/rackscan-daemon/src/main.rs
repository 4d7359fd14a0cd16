//! Rackscan Daemon - Main entry point
//!
//! Scans the equipment directory once, persists what it finds, and serves
//! the inventory to TCP clients.

mod config;
mod connection;
mod server;
mod state;

use anyhow::Result;
use clap::Parser;
use rackscan_core::parse_level;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "rackscan")]
#[command(about = "Network equipment inventory server")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "rackscan.toml")]
    config: PathBuf,

    /// TCP port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Equipment directory (defaults to `equipment` beside the executable)
    #[arg(short, long)]
    equipment_dir: Option<PathBuf>,

    /// Path to the SQLite database
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Ingest the equipment directory, print the inventory and exit
    #[arg(long)]
    scan_once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(parse_level(&args.log_level, Level::INFO))
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Rackscan v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config = config::load_config(&args.config)?;

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(dir) = args.equipment_dir {
        config.equipment.dir = Some(dir);
    }
    if let Some(database) = args.database {
        config.database.path = database;
    }

    info!(
        port = config.server.port,
        database = %config.database.path.display(),
        "Configuration loaded"
    );

    let state = state::AppState::new(config).await?;
    state.ingest().await?;

    if args.scan_once {
        let inventory = state.inventory().await?;
        println!("Inventory holds {} equipment records:", inventory.len());
        for entry in inventory {
            println!("  - {} ({})", entry.name, entry.ip);
            if !entry.description.is_empty() {
                println!("    {}", entry.description);
            }
        }
        state.store.close().await;
        return Ok(());
    }

    server::run(state).await
}
