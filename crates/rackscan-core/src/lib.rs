//! Rackscan Core - Equipment model, XML ingestion, and inventory wire format
//!
//! This crate provides the foundational pieces of the Rackscan system:
//! - Equipment model (equipment blocks with nested boards and ports)
//! - Streaming XML ingestion of equipment description files
//! - The inventory projection served to clients and its JSON encoding

pub mod equipment;
pub mod ingest;
pub mod logging;
pub mod wire;

pub use equipment::{Board, Equipment, Port};
pub use ingest::{
    parse_equipment_file, parse_equipment_xml, scan_directory, IngestError, ScanReport,
};
pub use logging::parse_level;
pub use wire::{decode_inventory, encode_inventory, InventoryEntry, WireError, DEFAULT_PORT};
