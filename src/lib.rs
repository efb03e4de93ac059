//! Async TCP protocol test harness.
//!
//! Wirebench lets an operator describe byte-level packet layouts, send them
//! to arbitrary TCP endpoints once or on a repeating interval, track
//! per-endpoint connection liveness, and record every request/response
//! exchange for inspection.
//!
//! # Architecture
//!
//! - [`codec`]: validates offset-addressed field lists and converts them
//!   to and from raw bytes
//! - [`framing`]: optional magic/length/CRC envelope for integrity-checked
//!   transport, backed by [`checksum`]
//! - [`connection`]: registry of live sockets with a `Wait`/`Alive`/`Dead`
//!   liveness model and background peer-close detection
//! - [`sender`]: one-shot and repeating send jobs with exactly-once
//!   exchange bookkeeping
//! - [`store`] / [`notifier`]: the persistence and observer boundaries
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use wirebench::{FieldSpec, FieldType, Harness, PacketDefinition, Target};
//!
//! #[tokio::main]
//! async fn main() -> wirebench::Result<()> {
//!     let harness = Harness::in_memory();
//!
//!     let target = harness
//!         .store()
//!         .create_target(Target::new("edge", "127.0.0.1", 9000))
//!         .await?;
//!     let packet = harness
//!         .store()
//!         .create_packet(
//!             PacketDefinition::new(
//!                 target.id,
//!                 "ping",
//!                 vec![FieldSpec::literal(0, 1, FieldType::UInt8)],
//!             )
//!             .framed(),
//!         )
//!         .await?;
//!
//!     harness.manager().connect(target.id, &target.host, target.port).await?;
//!     let record = harness.sender().send_once(&target, &packet).await?;
//!     println!("response: {}", record.response_hex);
//!
//!     harness.sender().start(target, packet, Duration::from_secs(1));
//!     Ok(())
//! }
//! ```

pub mod checksum;
pub mod codec;
pub mod config;
pub mod connection;
mod error;
pub mod framing;
pub mod notifier;
pub mod sender;
pub mod store;
pub mod types;

pub use config::{HarnessConfig, TargetConfig};
pub use connection::ConnectionManager;
pub use error::*;
pub use notifier::{Event, Notifier};
pub use sender::PacketSender;
pub use store::{MemoryStore, Store};
pub use types::*;

use std::sync::Arc;

/// Unified entry point wiring the store, notifier, connection registry, and
/// sender together.
///
/// The pieces remain usable on their own; the facade only handles
/// construction order and shared handles.
pub struct Harness {
    store: Arc<dyn Store>,
    notifier: Notifier,
    manager: ConnectionManager,
    sender: PacketSender,
}

impl Harness {
    /// Build a harness over `store` with default tunables.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self::with_config(store, &HarnessConfig::default())
    }

    /// Build a harness over `store` using `config`'s tunables.
    pub fn with_config(store: Arc<dyn Store>, config: &HarnessConfig) -> Self {
        let notifier = Notifier::with_capacity(config.event_capacity);
        let manager = ConnectionManager::with_watch_pause(
            notifier.clone(),
            std::time::Duration::from_millis(config.watch_pause_ms),
        );
        let sender = PacketSender::with_read_buffer(
            store.clone(),
            manager.clone(),
            notifier.clone(),
            config.read_buffer_size,
        );
        Self { store, notifier, manager, sender }
    }

    /// Build a harness over a fresh [`MemoryStore`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Create store entries for every target listed in `config`.
    pub async fn seed_from_config(&self, config: &HarnessConfig) -> Result<Vec<Target>> {
        let mut seeded = Vec::with_capacity(config.targets.len());
        for entry in &config.targets {
            let target = self
                .store
                .create_target(Target::new(entry.name.clone(), entry.host.clone(), entry.port))
                .await?;
            seeded.push(target);
        }
        Ok(seeded)
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    pub fn sender(&self) -> &PacketSender {
        &self.sender
    }

    /// Subscribe to every event the harness publishes.
    pub fn events(&self) -> impl futures::Stream<Item = Event> + 'static {
        self.notifier.subscribe()
    }
}
