//! Packet send orchestration.
//!
//! [`PacketSender`] drives both single-shot and repeating sends. A send
//! serializes the packet through the codec, optionally wraps it in the
//! integrity envelope, writes it over the target's registered connection,
//! and reads one bounded response. Only after a complete successful read is
//! the exchange recorded and observers notified: exactly one history record
//! and one `response` event per completed exchange.
//!
//! Repeating jobs are keyed by `(target id, packet id)`; starting an
//! already-running key is a no-op, and a failed tick is reported without
//! stopping the job.

use crate::connection::{self, ConnectionManager};
use crate::notifier::{Event, Notifier};
use crate::store::Store;
use crate::types::{ExchangeRecord, PacketDefinition, Target};
use crate::{HarnessError, Result, codec, framing};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default response read buffer size, in bytes.
pub const DEFAULT_READ_BUFFER: usize = 4096;

type JobKey = (u64, u64);

struct SenderInner {
    store: Arc<dyn Store>,
    manager: ConnectionManager,
    notifier: Notifier,
    jobs: Mutex<HashMap<JobKey, CancellationToken>>,
    read_buffer: usize,
}

/// Coordinates send jobs over the connection registry.
///
/// Cloning is cheap; all clones share the job table.
#[derive(Clone)]
pub struct PacketSender {
    inner: Arc<SenderInner>,
}

impl PacketSender {
    pub fn new(store: Arc<dyn Store>, manager: ConnectionManager, notifier: Notifier) -> Self {
        Self::with_read_buffer(store, manager, notifier, DEFAULT_READ_BUFFER)
    }

    /// Build a sender with a custom response buffer size.
    pub fn with_read_buffer(
        store: Arc<dyn Store>,
        manager: ConnectionManager,
        notifier: Notifier,
        read_buffer: usize,
    ) -> Self {
        Self {
            inner: Arc::new(SenderInner {
                store,
                manager,
                notifier,
                jobs: Mutex::new(HashMap::new()),
                read_buffer,
            }),
        }
    }

    /// Perform one complete exchange and record it.
    ///
    /// Requires a connection already registered for `target.id`; sending
    /// never dials on its own. Any codec, framing, or transport failure
    /// surfaces to the caller and leaves no history record.
    pub async fn send_once(
        &self,
        target: &Target,
        packet: &PacketDefinition,
    ) -> Result<ExchangeRecord> {
        codec::validate(&packet.fields)?;
        let request = codec::encode(&packet.fields);
        let wire = if packet.use_framing { framing::frame(&request) } else { request.clone() };

        let stream = self
            .inner
            .manager
            .connection(target.id)
            .ok_or(HarnessError::NoConnection { target_id: target.id })?;

        connection::write_all(&stream, &wire)
            .await
            .map_err(|e| HarnessError::io(format!("write to {}", target.addr()), e))?;

        let mut buf = vec![0u8; self.inner.read_buffer];
        let read = connection::read_chunk(&stream, &mut buf)
            .await
            .map_err(|e| HarnessError::io(format!("read from {}", target.addr()), e))?;
        if read == 0 {
            return Err(HarnessError::connection_failed(format!(
                "{} closed the connection before responding",
                target.addr()
            )));
        }

        let raw = &buf[..read];
        let response = if packet.use_framing { framing::unframe(raw)?.to_vec() } else { raw.to_vec() };

        let record = ExchangeRecord::new(
            target.id,
            packet,
            hex::encode(&request),
            hex::encode(&response),
        );
        let record = self.inner.store.append_history(record).await?;

        self.inner.notifier.publish(Event::Response {
            target_id: target.id,
            packet_id: packet.id,
            packet_name: packet.name.clone(),
            packet_desc: packet.desc.clone(),
            request_hex: record.request_hex.clone(),
            response_hex: record.response_hex.clone(),
        });
        info!(target_id = target.id, packet_id = packet.id, "exchange recorded");
        Ok(record)
    }

    /// Begin a repeating send job for `(target.id, packet.id)`.
    ///
    /// Idempotent: if a job with that key is already active this call does
    /// nothing. The first send fires one full `interval` after start, and a
    /// failed tick is logged and published but never stops the job.
    pub fn start(&self, target: Target, packet: PacketDefinition, interval: Duration) {
        let key = (target.id, packet.id);
        let token = {
            let mut jobs = self.jobs();
            if jobs.contains_key(&key) {
                debug!(target_id = key.0, packet_id = key.1, "job already running");
                return;
            }
            let token = CancellationToken::new();
            jobs.insert(key, token.clone());
            token
        };
        info!(target_id = key.0, packet_id = key.1, ?interval, "repeat job started");

        let sender = self.clone();
        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = sender.send_once(&target, &packet).await {
                            warn!(
                                target_id = target.id,
                                packet_id = packet.id,
                                error = %e,
                                "tick send failed"
                            );
                            sender.inner.notifier.publish(Event::Log {
                                target_id: target.id,
                                message: format!("send of '{}' failed: {e}", packet.name),
                            });
                        }
                    }
                }
            }
            debug!(target_id = target.id, packet_id = packet.id, "repeat job ended");
        });
    }

    /// Cancel and remove the job for `(target_id, packet_id)`.
    ///
    /// Idempotent; unknown keys are ignored.
    pub fn stop(&self, target_id: u64, packet_id: u64) {
        let token = self.jobs().remove(&(target_id, packet_id));
        if let Some(token) = token {
            token.cancel();
            info!(target_id, packet_id, "repeat job stopped");
        }
    }

    /// Keys of the currently active repeat jobs.
    pub fn active_jobs(&self) -> Vec<JobKey> {
        let mut keys: Vec<_> = self.jobs().keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    fn jobs(&self) -> MutexGuard<'_, HashMap<JobKey, CancellationToken>> {
        self.inner.jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
