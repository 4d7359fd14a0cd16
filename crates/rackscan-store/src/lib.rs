//! Rackscan Store - Durable inventory of equipment projections
//!
//! Equipment is persisted to a single SQLite table keyed by IP address.
//! Only the `{ip, name, description}` projection is stored; board and
//! port detail stays in memory.

pub mod store;

pub use store::{BatchOutcome, InventoryStore, StoreError};
