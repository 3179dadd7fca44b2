//! Registered client queues
//!
//! Owned by the hub task and only touched from the hub thread, so it needs no
//! locking. Other threads reach it through `HubCommand`s.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};

use super::payload::{ClientId, Payload};
use crate::stats::HubStats;

/// Queue and bookkeeping for one active client
#[derive(Debug)]
struct ClientEntry {
    queue: mpsc::Sender<Payload>,
    peer_addr: SocketAddr,
    dropped: u64,
}

/// Result of one fan-out pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOut {
    /// Clients the payload was queued for
    pub enqueued: usize,
    /// Clients whose queue was full
    pub dropped: usize,
}

/// Map of active clients to their outbound queues
///
/// An entry exists exactly while its connection is active: it is added when
/// the connection is accepted and removed by the connection's own exit path.
#[derive(Debug)]
pub struct BroadcastState {
    clients: HashMap<ClientId, ClientEntry>,
    stats: Arc<HubStats>,
}

impl BroadcastState {
    pub fn new(stats: Arc<HubStats>) -> Self {
        Self {
            clients: HashMap::new(),
            stats,
        }
    }

    /// Add a client queue
    pub fn register(&mut self, id: ClientId, peer_addr: SocketAddr, queue: mpsc::Sender<Payload>) {
        let entry = ClientEntry {
            queue,
            peer_addr,
            dropped: 0,
        };
        if self.clients.insert(id, entry).is_none() {
            self.stats.record_connected();
        }

        tracing::debug!(
            client_id = %id,
            peer = %peer_addr,
            clients = self.clients.len(),
            "Client registered"
        );
    }

    /// Remove a client queue
    ///
    /// Returns `false` if the client was not registered.
    pub fn unregister(&mut self, id: ClientId) -> bool {
        match self.clients.remove(&id) {
            Some(entry) => {
                self.stats.record_disconnected();
                tracing::debug!(
                    client_id = %id,
                    peer = %entry.peer_addr,
                    dropped = entry.dropped,
                    clients = self.clients.len(),
                    "Client unregistered"
                );
                true
            }
            None => false,
        }
    }

    /// Queue `payload` for every registered client without waiting
    ///
    /// A full queue drops the payload for that client only; the client stays
    /// registered and keeps what it already had queued.
    pub fn fan_out(&mut self, payload: &Payload) -> FanOut {
        let mut result = FanOut::default();

        for (id, entry) in self.clients.iter_mut() {
            match entry.queue.try_send(payload.clone()) {
                Ok(()) => {
                    result.enqueued += 1;
                    self.stats.record_enqueued();
                }
                Err(TrySendError::Full(_)) => {
                    entry.dropped += 1;
                    result.dropped += 1;
                    self.stats.record_dropped();
                    tracing::warn!(
                        client_id = %id,
                        peer = %entry.peer_addr,
                        dropped = entry.dropped,
                        "Client queue full, payload dropped"
                    );
                }
                Err(TrySendError::Closed(_)) => {
                    // Connection is exiting; its Unregister is on the way
                    tracing::trace!(client_id = %id, "Client queue closed");
                }
            }
        }

        tracing::trace!(
            bytes = payload.len(),
            enqueued = result.enqueued,
            dropped = result.dropped,
            "Payload fanned out"
        );

        result
    }

    /// Payloads dropped for one client since it registered
    pub fn dropped_for(&self, id: ClientId) -> Option<u64> {
        self.clients.get(&id).map(|entry| entry.dropped)
    }

    pub fn contains(&self, id: ClientId) -> bool {
        self.clients.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Drop every queue, which ends each connection's send loop
    pub fn clear(&mut self) {
        let ids: Vec<ClientId> = self.clients.keys().copied().collect();
        for id in ids {
            self.unregister(id);
        }
    }
}
