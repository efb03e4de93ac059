//! Persistence boundary.
//!
//! The harness core never assumes a storage engine; it produces and consumes
//! the value types in [`crate::types`] through the [`Store`] trait. Create
//! operations return the stored value with its assigned id, and reads are
//! consistent with the most recent create/update from the same process.
//!
//! [`MemoryStore`] is the reference implementation, suitable for tests and
//! for embedding the harness without an external database.

use crate::codec;
use crate::types::{ExchangeRecord, PacketDefinition, Target};
use crate::{HarnessError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Keyed CRUD over targets and packet definitions, append/list over history.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Persist a new target and return it with its assigned id.
    async fn create_target(&self, target: Target) -> Result<Target>;
    async fn target(&self, id: u64) -> Result<Target>;
    async fn targets(&self) -> Result<Vec<Target>>;
    async fn update_target(&self, target: Target) -> Result<Target>;
    async fn delete_target(&self, id: u64) -> Result<()>;

    /// Persist a new packet definition and return it with its assigned id.
    ///
    /// Definitions must pass chain validation before they are stored.
    async fn create_packet(&self, packet: PacketDefinition) -> Result<PacketDefinition>;
    async fn packet(&self, id: u64) -> Result<PacketDefinition>;
    async fn packets_for_target(&self, target_id: u64) -> Result<Vec<PacketDefinition>>;
    async fn update_packet(&self, packet: PacketDefinition) -> Result<PacketDefinition>;
    async fn delete_packet(&self, id: u64) -> Result<()>;

    /// Append one exchange record and return it with its assigned id.
    async fn append_history(&self, record: ExchangeRecord) -> Result<ExchangeRecord>;
    async fn history_for_target(&self, target_id: u64) -> Result<Vec<ExchangeRecord>>;
}

#[derive(Default)]
struct Tables {
    targets: HashMap<u64, Target>,
    packets: HashMap<u64, PacketDefinition>,
    history: Vec<ExchangeRecord>,
    next_target_id: u64,
    next_packet_id: u64,
    next_history_id: u64,
}

/// In-process [`Store`] backed by maps behind an async lock.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_target(&self, mut target: Target) -> Result<Target> {
        let mut tables = self.tables.write().await;
        tables.next_target_id += 1;
        target.id = tables.next_target_id;
        tables.targets.insert(target.id, target.clone());
        Ok(target)
    }

    async fn target(&self, id: u64) -> Result<Target> {
        let tables = self.tables.read().await;
        tables.targets.get(&id).cloned().ok_or_else(|| HarnessError::not_found("target", id))
    }

    async fn targets(&self) -> Result<Vec<Target>> {
        let tables = self.tables.read().await;
        let mut all: Vec<_> = tables.targets.values().cloned().collect();
        all.sort_by_key(|target| target.id);
        Ok(all)
    }

    async fn update_target(&self, target: Target) -> Result<Target> {
        let mut tables = self.tables.write().await;
        if !tables.targets.contains_key(&target.id) {
            return Err(HarnessError::not_found("target", target.id));
        }
        tables.targets.insert(target.id, target.clone());
        Ok(target)
    }

    async fn delete_target(&self, id: u64) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables
            .targets
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| HarnessError::not_found("target", id))
    }

    async fn create_packet(&self, mut packet: PacketDefinition) -> Result<PacketDefinition> {
        codec::validate(&packet.fields)?;
        let mut tables = self.tables.write().await;
        tables.next_packet_id += 1;
        packet.id = tables.next_packet_id;
        tables.packets.insert(packet.id, packet.clone());
        Ok(packet)
    }

    async fn packet(&self, id: u64) -> Result<PacketDefinition> {
        let tables = self.tables.read().await;
        tables.packets.get(&id).cloned().ok_or_else(|| HarnessError::not_found("packet", id))
    }

    async fn packets_for_target(&self, target_id: u64) -> Result<Vec<PacketDefinition>> {
        let tables = self.tables.read().await;
        let mut matching: Vec<_> = tables
            .packets
            .values()
            .filter(|packet| packet.target_id == target_id)
            .cloned()
            .collect();
        matching.sort_by_key(|packet| packet.id);
        Ok(matching)
    }

    async fn update_packet(&self, packet: PacketDefinition) -> Result<PacketDefinition> {
        codec::validate(&packet.fields)?;
        let mut tables = self.tables.write().await;
        if !tables.packets.contains_key(&packet.id) {
            return Err(HarnessError::not_found("packet", packet.id));
        }
        tables.packets.insert(packet.id, packet.clone());
        Ok(packet)
    }

    async fn delete_packet(&self, id: u64) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables
            .packets
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| HarnessError::not_found("packet", id))
    }

    async fn append_history(&self, mut record: ExchangeRecord) -> Result<ExchangeRecord> {
        let mut tables = self.tables.write().await;
        tables.next_history_id += 1;
        record.id = tables.next_history_id;
        tables.history.push(record.clone());
        Ok(record)
    }

    async fn history_for_target(&self, target_id: u64) -> Result<Vec<ExchangeRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .history
            .iter()
            .filter(|record| record.target_id == target_id)
            .cloned()
            .collect())
    }
}
