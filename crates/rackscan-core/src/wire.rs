//! Inventory wire format
//!
//! The protocol has no framing: the client sends any non-empty payload and
//! the server answers with a single UTF-8 JSON array of inventory entries.
//! The end of the message is the end of the connection, or the first point
//! at which the received bytes decode as a complete array.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default TCP port the server listens on
pub const DEFAULT_PORT: u16 = 12345;

#[derive(Error, Debug)]
pub enum WireError {
    #[error("Failed to encode inventory: {0}")]
    EncodeError(#[source] serde_json::Error),
    #[error("Failed to decode inventory: {0}")]
    DecodeError(#[source] serde_json::Error),
}

/// The client-visible projection of a piece of equipment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Serialize the inventory into the response payload
pub fn encode_inventory(entries: &[InventoryEntry]) -> Result<Vec<u8>, WireError> {
    serde_json::to_vec_pretty(entries).map_err(WireError::EncodeError)
}

/// Parse a response payload back into inventory entries
pub fn decode_inventory(payload: &[u8]) -> Result<Vec<InventoryEntry>, WireError> {
    serde_json::from_slice(payload).map_err(WireError::DecodeError)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_inventory_is_bare_brackets() {
        let payload = encode_inventory(&[]).unwrap();
        assert_eq!(payload, b"[]");
    }

    #[test]
    fn test_entry_has_exactly_three_string_fields() {
        let entries = vec![InventoryEntry {
            ip: "192.168.1.10".to_string(),
            name: "edge-router".to_string(),
            description: "Edge router".to_string(),
        }];

        let payload = encode_inventory(&entries).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&payload).unwrap();
        let object = value[0].as_object().unwrap();
        assert_eq!(object.len(), 3);
        assert_eq!(object["ip"], "192.168.1.10");
        assert_eq!(object["name"], "edge-router");
        assert_eq!(object["description"], "Edge router");
    }

    #[test]
    fn test_decode_tolerates_missing_fields() {
        let entries = decode_inventory(br#"[{"ip": "10.0.0.5"}]"#).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].ip, "10.0.0.5");
        assert!(entries[0].name.is_empty());
    }

    #[test]
    fn test_decode_partial_payload_fails() {
        assert!(decode_inventory(br#"[{"ip": "10.0"#).is_err());
    }
}
