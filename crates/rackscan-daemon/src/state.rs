//! Application state management

use anyhow::{bail, Result};
use rackscan_core::{scan_directory, InventoryEntry};
use rackscan_store::{BatchOutcome, InventoryStore, StoreError};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::info;

use crate::config::Config;

/// Shared application state
pub struct AppState {
    /// Inventory store
    pub store: InventoryStore,
    /// Configuration
    pub config: Config,
    /// Directory scanned for equipment files
    pub equipment_dir: PathBuf,
    /// Number of open client connections
    connections: AtomicUsize,
}

impl AppState {
    /// Open the store and resolve the equipment directory.
    ///
    /// Fails when the database cannot be opened or the equipment directory
    /// does not exist; the server has nothing to serve in either case.
    pub async fn new(config: Config) -> Result<Arc<Self>> {
        let store = InventoryStore::open(&config.database.path).await?;

        let equipment_dir = config.equipment_dir()?;
        info!(path = %equipment_dir.display(), "Equipment directory");
        if !equipment_dir.is_dir() {
            bail!(
                "Equipment directory not found: {}",
                equipment_dir.display()
            );
        }

        Ok(Self::from_parts(config, store, equipment_dir))
    }

    pub fn from_parts(config: Config, store: InventoryStore, equipment_dir: PathBuf) -> Arc<Self> {
        Arc::new(Self {
            store,
            config,
            equipment_dir,
            connections: AtomicUsize::new(0),
        })
    }

    /// Scan the equipment directory and persist everything that parsed.
    ///
    /// The batch is committed as a whole, so readers never see half of it.
    pub async fn ingest(&self) -> Result<BatchOutcome> {
        let dir = self.equipment_dir.clone();
        let report = tokio::task::spawn_blocking(move || scan_directory(&dir)).await??;

        let outcome = self.store.upsert_batch(&report.equipment).await?;
        info!(
            files_failed = report.failed.len(),
            stored = outcome.stored,
            skipped = outcome.skipped,
            "Equipment ingested"
        );
        Ok(outcome)
    }

    /// Current inventory as served to clients
    pub async fn inventory(&self) -> Result<Vec<InventoryEntry>, StoreError> {
        self.store.list_all().await
    }

    /// Record a new connection, returning the number now open
    pub fn connection_opened(&self) -> usize {
        self.connections.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Record a closed connection, returning the number still open
    pub fn connection_closed(&self) -> usize {
        self.connections.fetch_sub(1, Ordering::Relaxed).saturating_sub(1)
    }
}
