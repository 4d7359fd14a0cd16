//! Inventory request over TCP

use rackscan_core::{decode_inventory, InventoryEntry, WireError};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, trace};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Timed out connecting to {0}")]
    ConnectTimeout(String),
    #[error("Server closed the connection without a response")]
    NoResponse,
    #[error(transparent)]
    Wire(#[from] WireError),
}

/// Send `request` to `host:port` and read back the inventory.
///
/// The response carries no length, so the payload counts as complete once
/// it decodes as a JSON array, or when the server closes the connection.
pub async fn fetch_inventory(
    host: &str,
    port: u16,
    request: &[u8],
) -> Result<Vec<InventoryEntry>, FetchError> {
    let target = format!("{}:{}", host, port);
    let mut stream = timeout(CONNECT_TIMEOUT, TcpStream::connect(&target))
        .await
        .map_err(|_| FetchError::ConnectTimeout(target.clone()))??;
    debug!(target = %target, "Connected");

    stream.write_all(request).await?;

    let mut payload = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let len = stream.read(&mut chunk).await?;
        if len == 0 {
            break;
        }
        payload.extend_from_slice(&chunk[..len]);
        trace!(received = payload.len(), "Read response chunk");

        if ends_with_closing_bracket(&payload) {
            if let Ok(entries) = decode_inventory(&payload) {
                return Ok(entries);
            }
        }
    }

    if payload.is_empty() {
        return Err(FetchError::NoResponse);
    }
    Ok(decode_inventory(&payload)?)
}

/// A complete array must end in `]`; anything else is still arriving
fn ends_with_closing_bracket(payload: &[u8]) -> bool {
    payload.iter().rev().find(|b| !b.is_ascii_whitespace()) == Some(&b']')
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn fake_server<F, Fut>(respond: F) -> u16
    where
        F: FnOnce(TcpStream) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ()> + Send,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            respond(stream).await;
        });
        port
    }

    #[tokio::test]
    async fn test_complete_payload_ends_read_without_close() {
        let port = fake_server(|mut stream| async move {
            let mut request = [0u8; 64];
            let len = stream.read(&mut request).await.unwrap();
            assert_eq!(&request[..len], b"GET_DATA");

            stream.write_all(br#"[{"ip": "10.0.0.1", "na"#).await.unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
            stream
                .write_all(br#"me": "core", "description": "Core"}]"#)
                .await
                .unwrap();
            // Keep the connection open; the client must stop on its own
            tokio::time::sleep(Duration::from_secs(30)).await;
        })
        .await;

        let entries = timeout(
            Duration::from_secs(5),
            fetch_inventory("127.0.0.1", port, b"GET_DATA"),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "core");
    }

    #[test]
    fn test_closing_bracket_detection() {
        assert!(ends_with_closing_bracket(b"[]"));
        assert!(ends_with_closing_bracket(b"[\n  {\"ip\": \"10.0.0.1\"}\n]\n  "));
        assert!(!ends_with_closing_bracket(br#"[{"ip": "10.0.0.1"}"#));
        assert!(!ends_with_closing_bracket(b""));
        assert!(!ends_with_closing_bracket(b"  \n"));
    }

    #[tokio::test]
    async fn test_payload_split_inside_array_waits_for_rest() {
        let port = fake_server(|mut stream| async move {
            let mut request = [0u8; 64];
            let _ = stream.read(&mut request).await.unwrap();

            stream.write_all(b"[\n  {\"ip\": \"10.0.0.1\"},").await.unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
            stream.write_all(b"\n  {\"ip\": \"10.0.0.2\"}\n]").await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        })
        .await;

        let entries = timeout(
            Duration::from_secs(5),
            fetch_inventory("127.0.0.1", port, b"GET_DATA"),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].ip, "10.0.0.2");
    }

    #[tokio::test]
    async fn test_empty_inventory() {
        let port = fake_server(|mut stream| async move {
            let mut request = [0u8; 64];
            let _ = stream.read(&mut request).await.unwrap();
            stream.write_all(b"[]").await.unwrap();
        })
        .await;

        let entries = fetch_inventory("127.0.0.1", port, b"GET_DATA").await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_close_without_response() {
        let port = fake_server(|mut stream| async move {
            let mut request = [0u8; 64];
            let _ = stream.read(&mut request).await.unwrap();
        })
        .await;

        let result = fetch_inventory("127.0.0.1", port, b"GET_DATA").await;
        assert!(matches!(result, Err(FetchError::NoResponse)));
    }

    #[tokio::test]
    async fn test_truncated_response() {
        let port = fake_server(|mut stream| async move {
            let mut request = [0u8; 64];
            let _ = stream.read(&mut request).await.unwrap();
            stream.write_all(br#"[{"ip": "10.0"#).await.unwrap();
        })
        .await;

        let result = fetch_inventory("127.0.0.1", port, b"GET_DATA").await;
        assert!(matches!(result, Err(FetchError::Wire(_))));
    }
}
