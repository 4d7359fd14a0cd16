//! Inventory store over SQLite

use rackscan_core::{Equipment, InventoryEntry};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info, warn};

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS equipment (
        ip TEXT PRIMARY KEY,
        name TEXT,
        description TEXT
    )
"#;

const UPSERT: &str =
    "INSERT OR REPLACE INTO equipment (ip, name, description) VALUES (?1, ?2, ?3)";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Equipment record has no IP address")]
    MissingIp,
}

/// Outcome of applying a batch of equipment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub stored: usize,
    pub skipped: usize,
}

#[derive(sqlx::FromRow)]
struct EquipmentRow {
    ip: String,
    name: Option<String>,
    description: Option<String>,
}

impl From<EquipmentRow> for InventoryEntry {
    fn from(row: EquipmentRow) -> Self {
        Self {
            ip: row.ip,
            name: row.name.unwrap_or_default(),
            description: row.description.unwrap_or_default(),
        }
    }
}

/// Equipment projections keyed by IP address.
///
/// Cloning is cheap and shares the underlying connection pool, so each
/// connection handler can hold its own copy.
#[derive(Clone)]
pub struct InventoryStore {
    pool: SqlitePool,
}

impl InventoryStore {
    /// Open (creating if necessary) the database file at `path`
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.create_schema().await?;
        info!(path = %path.display(), "Opened inventory database");
        Ok(store)
    }

    /// Open a private in-memory database
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        // A single connection that is never recycled, otherwise the data goes with it
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.create_schema().await?;
        Ok(store)
    }

    async fn create_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    /// Insert or replace the record keyed by the equipment's IP address
    pub async fn upsert(&self, equipment: &Equipment) -> Result<(), StoreError> {
        if equipment.ip.is_empty() {
            return Err(StoreError::MissingIp);
        }

        sqlx::query(UPSERT)
            .bind(equipment.ip.as_str())
            .bind(equipment.name.as_str())
            .bind(equipment.description.as_str())
            .execute(&self.pool)
            .await?;

        debug!(ip = %equipment.ip, name = %equipment.name, "Stored equipment");
        Ok(())
    }

    /// Upsert a whole batch inside one transaction.
    ///
    /// Records that fail individually are logged and skipped; the rest of
    /// the batch becomes visible to [`list_all`](Self::list_all) at once
    /// when the transaction commits.
    pub async fn upsert_batch(&self, batch: &[Equipment]) -> Result<BatchOutcome, StoreError> {
        let mut outcome = BatchOutcome::default();
        let mut tx = self.pool.begin().await?;

        for equipment in batch {
            if equipment.ip.is_empty() {
                warn!(name = %equipment.name, "Skipping equipment without IP address");
                outcome.skipped += 1;
                continue;
            }

            let result = sqlx::query(UPSERT)
                .bind(equipment.ip.as_str())
                .bind(equipment.name.as_str())
                .bind(equipment.description.as_str())
                .execute(&mut *tx)
                .await;

            match result {
                Ok(_) => {
                    debug!(ip = %equipment.ip, name = %equipment.name, "Stored equipment");
                    outcome.stored += 1;
                }
                Err(e) => {
                    warn!(ip = %equipment.ip, error = %e, "Failed to store equipment");
                    outcome.skipped += 1;
                }
            }
        }

        tx.commit().await?;
        Ok(outcome)
    }

    /// Every stored projection, ordered by IP address
    pub async fn list_all(&self) -> Result<Vec<InventoryEntry>, StoreError> {
        let rows = sqlx::query_as::<_, EquipmentRow>(
            "SELECT ip, name, description FROM equipment ORDER BY ip",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(InventoryEntry::from).collect())
    }

    /// Number of stored records
    pub async fn count(&self) -> Result<usize, StoreError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM equipment")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as usize)
    }

    /// Close the underlying pool
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
