//! Per-connection request handling
//!
//! A client sends any non-empty payload and receives the full inventory as
//! JSON. The request content is ignored. A peer that closes without sending
//! anything gets no response.

use rackscan_core::{encode_inventory, WireError};
use rackscan_store::{InventoryStore, StoreError};
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tracing::{debug, trace};

/// Size of the single read performed per connection
const READ_BUFFER_SIZE: usize = 4096;

#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Timed out waiting for request")]
    ReadTimeout,
    #[error("Timed out writing response")]
    WriteTimeout,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Wire(#[from] WireError),
}

/// Optional I/O deadlines for a connection
#[derive(Debug, Clone, Copy, Default)]
pub struct Deadlines {
    pub read: Option<Duration>,
    pub write: Option<Duration>,
}

/// What happened on a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Served {
    /// The peer closed before sending anything
    EmptyRequest,
    /// The inventory was written back
    Inventory { entries: usize, bytes: usize },
}

/// Serve one request on `stream`: read once, answer with the inventory.
pub async fn handle_connection<S>(
    mut stream: S,
    peer: SocketAddr,
    store: &InventoryStore,
    deadlines: Deadlines,
) -> Result<Served, ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buf = [0u8; READ_BUFFER_SIZE];
    let len = with_deadline(
        deadlines.read,
        stream.read(&mut buf),
        ConnectionError::ReadTimeout,
    )
    .await?;
    if len == 0 {
        debug!(peer = %peer, "Peer closed without a request");
        return Ok(Served::EmptyRequest);
    }
    trace!(
        peer = %peer,
        request = %String::from_utf8_lossy(&buf[..len]),
        "Received request"
    );

    let entries = store.list_all().await?;
    let payload = encode_inventory(&entries)?;

    let write = async {
        stream.write_all(&payload).await?;
        stream.shutdown().await
    };
    with_deadline(deadlines.write, write, ConnectionError::WriteTimeout).await?;

    debug!(peer = %peer, entries = entries.len(), bytes = payload.len(), "Sent inventory");
    Ok(Served::Inventory {
        entries: entries.len(),
        bytes: payload.len(),
    })
}

async fn with_deadline<F, T>(
    deadline: Option<Duration>,
    fut: F,
    on_timeout: ConnectionError,
) -> Result<T, ConnectionError>
where
    F: Future<Output = io::Result<T>>,
{
    match deadline {
        Some(duration) => match timeout(duration, fut).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(on_timeout),
        },
        None => Ok(fut.await?),
    }
}
