//! Exchange history records.

use super::PacketDefinition;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Immutable record of one completed send-then-receive exchange.
///
/// Created exactly once per successful read of a response; the packet name
/// and description are snapshotted so later edits to the definition do not
/// rewrite history. Request and response bytes are stored lowercase-hex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRecord {
    /// Store-assigned identity, 0 until appended.
    #[serde(default)]
    pub id: u64,
    pub target_id: u64,
    pub packet_id: u64,
    pub packet_name: String,
    pub packet_desc: String,
    pub request_hex: String,
    pub response_hex: String,
    pub created_at: SystemTime,
}

impl ExchangeRecord {
    /// Snapshot an exchange against `packet`, stamped with the current time.
    pub fn new(
        target_id: u64,
        packet: &PacketDefinition,
        request_hex: String,
        response_hex: String,
    ) -> Self {
        Self {
            id: 0,
            target_id,
            packet_id: packet.id,
            packet_name: packet.name.clone(),
            packet_desc: packet.desc.clone(),
            request_hex,
            response_hex,
            created_at: SystemTime::now(),
        }
    }
}
