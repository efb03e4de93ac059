//! Packet definitions.

use super::FieldSpec;
use serde::{Deserialize, Serialize};

/// An ordered set of field specs describing one packet layout.
///
/// `use_framing` selects whether outgoing bytes are wrapped in (and incoming
/// bytes unwrapped from) the integrity envelope. The field set must pass
/// chain validation before the packet is usable for sending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacketDefinition {
    /// Store-assigned identity, 0 until created.
    #[serde(default)]
    pub id: u64,
    pub target_id: u64,
    pub name: String,
    #[serde(default)]
    pub desc: String,
    pub fields: Vec<FieldSpec>,
    #[serde(default)]
    pub use_framing: bool,
}

impl PacketDefinition {
    /// Build an unsaved packet definition; the store assigns the id.
    pub fn new(target_id: u64, name: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self {
            id: 0,
            target_id,
            name: name.into(),
            desc: String::new(),
            fields,
            use_framing: false,
        }
    }

    /// Same definition with framing enabled.
    pub fn framed(mut self) -> Self {
        self.use_framing = true;
        self
    }
}
