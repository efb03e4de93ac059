//! Connection lifecycle management.
//!
//! The [`ConnectionManager`] owns every long-lived socket in the harness,
//! keyed by target id. Each target moves through a three-state liveness
//! model: `Wait` (never connected, or explicitly disconnected), `Alive`
//! (socket registered and believed healthy), and `Dead` (dial failed, peer
//! closed, or forcibly killed). Unknown targets report `Wait`.
//!
//! Every registered socket gets a background watcher that probes the read
//! half for peer-initiated closure without consuming data. A watcher whose
//! socket has been superseded by a newer `connect` detects that its handle
//! is no longer current and exits without touching shared state.
//!
//! The registry is guarded by one mutex per manager; the lock is held only
//! for map reads and mutations, never across socket I/O.

use crate::notifier::{Event, Notifier};
use crate::types::LinkStatus;
use crate::{HarnessError, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::io::Interest;
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Default pause between liveness probe rounds.
pub const DEFAULT_WATCH_PAUSE: Duration = Duration::from_millis(10);

struct ConnEntry {
    stream: Arc<TcpStream>,
    watcher: CancellationToken,
}

#[derive(Default)]
struct Registry {
    conns: HashMap<u64, ConnEntry>,
    status: HashMap<u64, LinkStatus>,
}

struct ManagerInner {
    registry: Mutex<Registry>,
    notifier: Notifier,
    watch_pause: Duration,
}

/// Registry of live TCP connections keyed by target id.
///
/// Cloning is cheap; all clones operate on the same registry.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<ManagerInner>,
}

impl ConnectionManager {
    pub fn new(notifier: Notifier) -> Self {
        Self::with_watch_pause(notifier, DEFAULT_WATCH_PAUSE)
    }

    /// Build a manager with a custom pause between liveness probes.
    pub fn with_watch_pause(notifier: Notifier, watch_pause: Duration) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                registry: Mutex::new(Registry::default()),
                notifier,
                watch_pause,
            }),
        }
    }

    /// Dial `host:port` and register the socket under `id`.
    ///
    /// No read or write deadline is applied; callers needing bounded dial
    /// latency wrap this in their own timeout. On failure the target is
    /// marked `Dead` and the dial error is returned. On success any prior
    /// socket under the same id is superseded atomically: its watcher is
    /// cancelled, the new socket becomes current, and the target is `Alive`.
    pub async fn connect(&self, id: u64, host: &str, port: u16) -> Result<()> {
        let addr = format!("{host}:{port}");
        debug!(target_id = id, %addr, "dialing");

        let stream = match TcpStream::connect(&addr).await {
            Ok(stream) => Arc::new(stream),
            Err(e) => {
                self.transition(id, LinkStatus::Dead);
                return Err(HarnessError::connection_failed_with_source(
                    format!("dial {addr} failed"),
                    Box::new(e),
                ));
            }
        };

        let watcher = CancellationToken::new();
        {
            let mut registry = self.registry();
            let entry = ConnEntry { stream: stream.clone(), watcher: watcher.clone() };
            if let Some(old) = registry.conns.insert(id, entry) {
                old.watcher.cancel();
            }
            registry.status.insert(id, LinkStatus::Alive);
        }
        self.inner.notifier.publish(Event::StatusChanged { target_id: id, status: LinkStatus::Alive });
        debug!(target_id = id, %addr, "connected");

        self.spawn_watcher(id, stream, watcher);
        Ok(())
    }

    /// Close and remove the socket for `id`, returning the target to `Wait`.
    ///
    /// No-op on the registry if no socket is present. This is the only path
    /// back to `Wait` from `Alive`.
    pub fn disconnect(&self, id: u64) {
        self.teardown(id, LinkStatus::Wait);
        debug!(target_id = id, "disconnected");
    }

    /// Close and remove the socket for `id` and force the state to `Dead`.
    ///
    /// Used when the remote process was killed out-of-band.
    pub fn mark_dead(&self, id: u64) {
        self.teardown(id, LinkStatus::Dead);
        debug!(target_id = id, "marked dead");
    }

    /// Current liveness of `id`. Unknown targets are `Wait`; never fails.
    pub fn status(&self, id: u64) -> LinkStatus {
        self.registry().status.get(&id).copied().unwrap_or(LinkStatus::Wait)
    }

    /// The live socket registered under `id`, if any.
    pub fn connection(&self, id: u64) -> Option<Arc<TcpStream>> {
        self.registry().conns.get(&id).map(|entry| entry.stream.clone())
    }

    /// Ephemeral reachability check: dial, report, hang up.
    ///
    /// Does not touch the registry or any target's recorded status.
    pub async fn probe(host: &str, port: u16, timeout: Duration) -> LinkStatus {
        let addr = format!("{host}:{port}");
        match tokio::time::timeout(timeout, TcpStream::connect(&addr)).await {
            Ok(Ok(_)) => LinkStatus::Alive,
            _ => LinkStatus::Dead,
        }
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.inner.registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn transition(&self, id: u64, status: LinkStatus) {
        let previous = self.registry().status.insert(id, status);
        if previous != Some(status) {
            self.inner.notifier.publish(Event::StatusChanged { target_id: id, status });
        }
    }

    fn teardown(&self, id: u64, status: LinkStatus) {
        let previous = {
            let mut registry = self.registry();
            if let Some(entry) = registry.conns.remove(&id) {
                entry.watcher.cancel();
            }
            registry.status.insert(id, status)
        };
        if previous != Some(status) {
            self.inner.notifier.publish(Event::StatusChanged { target_id: id, status });
        }
    }

    fn spawn_watcher(&self, id: u64, stream: Arc<TcpStream>, token: CancellationToken) {
        let manager = self.clone();
        let pause = self.inner.watch_pause;
        tokio::spawn(async move {
            debug!(target_id = id, "liveness watch started");
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        debug!(target_id = id, "liveness watch cancelled");
                        return;
                    }
                    _ = tokio::time::sleep(pause) => {}
                }

                let ready = tokio::select! {
                    _ = token.cancelled() => {
                        debug!(target_id = id, "liveness watch cancelled");
                        return;
                    }
                    ready = stream.ready(Interest::READABLE) => ready,
                };

                match ready {
                    Ok(ready) if ready.is_read_closed() => break,
                    // Readable without closure means data is waiting for a
                    // reader; not the watcher's to consume.
                    Ok(_) => {}
                    Err(e) => {
                        debug!(target_id = id, error = %e, "liveness probe failed");
                        break;
                    }
                }
            }
            manager.reap(id, &stream);
        });
    }

    /// Remove a dead socket, but only if it is still the current one.
    fn reap(&self, id: u64, stream: &Arc<TcpStream>) {
        let removed = {
            let mut registry = self.registry();
            match registry.conns.get(&id) {
                Some(entry) if Arc::ptr_eq(&entry.stream, stream) => {
                    registry.conns.remove(&id);
                    registry.status.insert(id, LinkStatus::Dead);
                    true
                }
                // A newer connect superseded this socket; exit quietly.
                _ => false,
            }
        };
        if removed {
            warn!(target_id = id, "peer closed connection");
            self.inner.notifier.publish(Event::StatusChanged {
                target_id: id,
                status: LinkStatus::Dead,
            });
        }
    }
}

/// Write the whole buffer to `stream`.
///
/// Blocks the calling task until every byte is accepted or an error occurs.
pub async fn write_all(stream: &TcpStream, mut data: &[u8]) -> std::io::Result<()> {
    while !data.is_empty() {
        stream.writable().await?;
        match stream.try_write(data) {
            Ok(written) => data = &data[written..],
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Read one chunk from `stream` into `buf`.
///
/// Returns the byte count of the first successful read; `Ok(0)` means the
/// peer closed the connection.
pub async fn read_chunk(stream: &TcpStream, buf: &mut [u8]) -> std::io::Result<usize> {
    loop {
        stream.readable().await?;
        match stream.try_read(buf) {
            Ok(read) => return Ok(read),
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => continue,
            Err(e) => return Err(e),
        }
    }
}
