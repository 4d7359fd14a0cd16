//! TCP server setup and accept loop

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::connection::{handle_connection, Deadlines, Served};
use crate::state::AppState;

/// Bind the configured address and serve until the process exits
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listener = bind(state.config.server.bind_addr()).await?;
    serve(listener, state).await
}

/// Bind the listening socket; failure here is fatal for startup
pub async fn bind(addr: SocketAddr) -> Result<TcpListener> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(address = %listener.local_addr()?, "Listening for inventory clients");
    Ok(listener)
}

/// Accept connections forever, each handled on its own task
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> Result<()> {
    if let Some(every) = state.config.equipment.rescan_interval() {
        let rescan_state = state.clone();
        tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick fires immediately and startup already scanned
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = rescan_state.ingest().await {
                    error!(error = %e, "Equipment re-scan failed");
                }
            }
        });
        info!(interval_secs = every.as_secs(), "Periodic equipment re-scan enabled");
    }

    let deadlines = Deadlines {
        read: state.config.server.read_timeout(),
        write: state.config.server.write_timeout(),
    };

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(error = %e, "Failed to accept connection");
                continue;
            }
        };

        let state = state.clone();
        tokio::spawn(async move {
            serve_client(stream, peer, &state, deadlines).await;
        });
    }
}

async fn serve_client(
    stream: TcpStream,
    peer: SocketAddr,
    state: &AppState,
    deadlines: Deadlines,
) {
    let open = state.connection_opened();
    info!(peer = %peer, open, "Client connected");

    match handle_connection(stream, peer, &state.store, deadlines).await {
        Ok(Served::Inventory { entries, bytes }) => {
            debug!(peer = %peer, entries, bytes, "Request served");
        }
        Ok(Served::EmptyRequest) => {}
        Err(e) => warn!(peer = %peer, error = %e, "Connection failed"),
    }

    let open = state.connection_closed();
    info!(peer = %peer, open, "Client disconnected");
}
