//! rackscan-client - Fetch and display the equipment inventory
//!
//! Connects to a Rackscan server, requests the inventory and prints it as a
//! table. Connection failures are reported and retried after a fixed delay.

mod fetch;
mod view;

use anyhow::Result;
use clap::Parser;
use rackscan_core::{encode_inventory, parse_level, DEFAULT_PORT};
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crate::fetch::fetch_inventory;
use crate::view::render_table;

#[derive(Parser, Debug)]
#[command(name = "rackscan-client")]
#[command(about = "Display the inventory served by a Rackscan server")]
#[command(version)]
struct Args {
    /// Server host name or address
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Server port
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Request payload (the server ignores its content)
    #[arg(long, default_value = "GET_DATA")]
    request: String,

    /// Seconds to wait before reconnecting
    #[arg(long, default_value = "5")]
    retry_delay_secs: u64,

    /// Give up after the first failed attempt
    #[arg(long, conflicts_with = "watch")]
    once: bool,

    /// Keep refreshing the inventory every retry delay
    #[arg(long)]
    watch: bool,

    /// Print the raw JSON payload instead of a table
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(parse_level(&args.log_level, Level::WARN))
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let retry_delay = Duration::from_secs(args.retry_delay_secs);
    let mut connected = false;

    loop {
        match fetch_inventory(&args.host, args.port, args.request.as_bytes()).await {
            Ok(entries) => {
                if !connected {
                    info!(host = %args.host, port = args.port, "Status: connected");
                    connected = true;
                }

                if args.json {
                    println!("{}", String::from_utf8_lossy(&encode_inventory(&entries)?));
                } else {
                    println!(
                        "Inventory from {}:{} at {} ({} records)",
                        args.host,
                        args.port,
                        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                        entries.len()
                    );
                    print!("{}", render_table(&entries));
                }

                if !args.watch {
                    return Ok(());
                }
            }
            Err(e) => {
                connected = false;
                eprintln!("Connection error: {}", e);
                if args.once {
                    return Err(e.into());
                }
                warn!(
                    retry_in_secs = retry_delay.as_secs(),
                    "Status: disconnected, will reconnect"
                );
            }
        }

        tokio::time::sleep(retry_delay).await;
    }
}
