//! Equipment types parsed from rack description files

use serde::{Deserialize, Serialize};

use crate::wire::InventoryEntry;

/// A physical connector on a board
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    /// Port identifier (`id` attribute)
    pub id: String,
    /// Ordinal number on the board (`Num`)
    pub num: i32,
    /// Media type code (`Media`)
    pub media: i32,
    /// Signal type code (`Signal`)
    pub signal: i32,
}

/// A board installed in a piece of equipment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    /// Board identifier (`id` attribute)
    pub id: String,
    /// Ordinal number within the equipment (`Num`)
    pub num: i32,
    /// Board name (`Name`)
    pub name: String,
    /// Declared port count (`PortCount`), advisory only
    pub port_count: i32,
    /// Internal links descriptor (`IntLinks`)
    pub int_links: String,
    /// Algorithm descriptor (`Algoritms` in the source data)
    pub algorithms: String,
    /// Ports in document order
    pub ports: Vec<Port>,
}

/// A piece of network equipment, identified by its IP address
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    /// Block identifier (`id` attribute)
    pub block_id: String,
    /// Human-readable name (`Name`)
    pub name: String,
    /// IP address, the identity of the record (`IP`)
    pub ip: String,
    /// Declared board count (`BoardCount`), advisory only
    pub board_count: i32,
    /// Row in the rack grid (`MtR`)
    pub rack_row: i32,
    /// Column in the rack grid (`MtC`)
    pub rack_column: i32,
    /// Free-form description (`Description`)
    pub description: String,
    /// Display label (`Label`)
    pub label: String,
    /// Boards in document order
    pub boards: Vec<Board>,
}

impl Equipment {
    /// Reduce to the `{ip, name, description}` projection that gets stored and served
    pub fn projection(&self) -> InventoryEntry {
        InventoryEntry {
            ip: self.ip.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }

    /// Total number of ports across all boards
    pub fn port_total(&self) -> usize {
        self.boards.iter().map(|b| b.ports.len()).sum()
    }
}
