//! Per-client send loop
//!
//! Each accepted viewer gets one task that drains its queue onto the socket.
//! The task deregisters itself when the loop ends; the hub never closes a
//! connection because of a full queue.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use super::hub::HubCommand;
use super::payload::{ClientId, Payload};
use crate::stats::HubStats;

/// Client connection lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientPhase {
    /// Accepted, socket not yet configured
    Connecting,
    /// Registered and delivering payloads
    Active,
    /// Send loop ended, tearing down
    Closing,
    /// Deregistered and closed
    Closed,
}

/// One viewer connection
pub struct ClientConnection<S> {
    id: ClientId,
    peer_addr: SocketAddr,
    stream: S,
    queue: mpsc::Receiver<Payload>,
    commands: mpsc::UnboundedSender<HubCommand>,
    stats: Arc<HubStats>,
    phase: ClientPhase,
    delivered: u64,
}

impl<S: AsyncWrite + Unpin> ClientConnection<S> {
    /// Wrap an accepted stream
    ///
    /// The connection starts in `Connecting` and serves nothing until
    /// `activate` is called once the socket is configured and registered.
    pub(crate) fn new(
        id: ClientId,
        peer_addr: SocketAddr,
        stream: S,
        queue: mpsc::Receiver<Payload>,
        commands: mpsc::UnboundedSender<HubCommand>,
        stats: Arc<HubStats>,
    ) -> Self {
        Self {
            id,
            peer_addr,
            stream,
            queue,
            commands,
            stats,
            phase: ClientPhase::Connecting,
            delivered: 0,
        }
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    pub fn phase(&self) -> ClientPhase {
        self.phase
    }

    /// Payloads written and flushed so far
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    pub(crate) fn stream(&self) -> &S {
        &self.stream
    }

    /// Mark the connection registered and ready to serve
    pub(crate) fn activate(&mut self) {
        if self.phase == ClientPhase::Connecting {
            self.phase = ClientPhase::Active;
        }
    }

    /// Deliver queued payloads until the transport fails or the queue closes
    ///
    /// Only an `Active` connection serves. The connection is `Closed` when
    /// this returns, and the return value is the number of payloads written
    /// and flushed.
    pub async fn run(&mut self) -> u64 {
        if self.phase != ClientPhase::Active {
            return self.delivered;
        }

        match self.send_loop().await {
            Ok(()) => {
                tracing::debug!(client_id = %self.id, "Client queue closed");
            }
            Err(e) => {
                tracing::debug!(
                    client_id = %self.id,
                    peer = %self.peer_addr,
                    error = %e,
                    "Client write failed"
                );
            }
        }

        self.close().await;
        self.delivered
    }

    async fn send_loop(&mut self) -> io::Result<()> {
        while let Some(payload) = self.queue.recv().await {
            self.stream.write_all(payload.as_bytes()).await?;
            self.stream.flush().await?;

            self.delivered += 1;
            self.stats.record_sent(payload.len());
        }
        Ok(())
    }

    async fn close(&mut self) {
        self.phase = ClientPhase::Closing;

        // Fails only if the hub already stopped, in which case the state is gone
        let _ = self.commands.send(HubCommand::Unregister(self.id));

        if let Err(e) = self.stream.shutdown().await {
            tracing::trace!(client_id = %self.id, error = %e, "Close error suppressed");
        }

        self.phase = ClientPhase::Closed;
        tracing::info!(
            client_id = %self.id,
            peer = %self.peer_addr,
            delivered = self.delivered,
            "Client closed"
        );
    }
}
