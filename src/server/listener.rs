//! Hub accept/dispatch loop
//!
//! Runs on the hub thread's current-thread runtime. One task multiplexes
//! inbound connections and hub commands, so every mutation of
//! `BroadcastState` happens here, in submission order.

use std::net::SocketAddr;
use std::sync::Arc;

use socket2::{SockRef, TcpKeepalive};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use super::config::HubConfig;
use super::connection::ClientConnection;
use super::hub::HubCommand;
use super::payload::ClientId;
use super::state::BroadcastState;
use crate::stats::HubStats;

pub(crate) struct HubServer {
    config: HubConfig,
    state: BroadcastState,
    commands: mpsc::UnboundedReceiver<HubCommand>,
    command_tx: mpsc::UnboundedSender<HubCommand>,
    stats: Arc<HubStats>,
    connections: JoinSet<u64>,
    next_client_id: u64,
}

impl HubServer {
    pub(crate) fn new(
        config: HubConfig,
        commands: mpsc::UnboundedReceiver<HubCommand>,
        command_tx: mpsc::UnboundedSender<HubCommand>,
        stats: Arc<HubStats>,
    ) -> Self {
        Self {
            config,
            state: BroadcastState::new(Arc::clone(&stats)),
            commands,
            command_tx,
            stats,
            connections: JoinSet::new(),
            next_client_id: 1,
        }
    }

    /// Serve until a shutdown command arrives
    pub(crate) async fn run(mut self, listener: TcpListener) {
        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((socket, peer_addr)) => self.handle_connection(socket, peer_addr),
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to accept connection");
                    }
                },
                command = self.commands.recv() => match command {
                    Some(HubCommand::Broadcast(payload)) => {
                        self.state.fan_out(&payload);
                    }
                    Some(HubCommand::Unregister(id)) => {
                        self.state.unregister(id);
                    }
                    Some(HubCommand::Shutdown) | None => break,
                },
                Some(_) = self.connections.join_next(), if !self.connections.is_empty() => {}
            }
        }

        drop(listener);
        self.shutdown().await;
    }

    fn handle_connection(&mut self, socket: TcpStream, peer_addr: SocketAddr) {
        let id = ClientId(self.next_client_id);
        self.next_client_id += 1;

        tracing::info!(client_id = %id, peer = %peer_addr, "Client connected");

        let (queue_tx, queue_rx) = mpsc::channel(self.config.queue_capacity.max(1));
        let mut connection = ClientConnection::new(
            id,
            peer_addr,
            socket,
            queue_rx,
            self.command_tx.clone(),
            Arc::clone(&self.stats),
        );

        // Dropping the connection here closes the socket without it ever becoming active
        if let Err(e) = configure_socket(connection.stream(), &self.config) {
            tracing::warn!(client_id = %id, peer = %peer_addr, error = %e, "Failed to configure socket");
            return;
        }

        self.state.register(id, peer_addr, queue_tx);
        connection.activate();

        self.connections.spawn(async move { connection.run().await });
    }

    async fn shutdown(mut self) {
        tracing::info!(clients = self.state.len(), "Broadcast hub shutting down");

        // Closing every queue lets each send loop finish and close its socket
        self.state.clear();

        let grace = self.config.shutdown_timeout;
        let connections = &mut self.connections;
        let drained = tokio::time::timeout(grace, async move {
            while connections.join_next().await.is_some() {}
        })
        .await;

        if drained.is_err() {
            tracing::warn!(
                remaining = self.connections.len(),
                "Client connections still open at shutdown, aborting"
            );
            self.connections.shutdown().await;
        }
    }
}

fn configure_socket(socket: &TcpStream, config: &HubConfig) -> std::io::Result<()> {
    if config.tcp_nodelay {
        socket.set_nodelay(true)?;
    }

    if config.tcp_keepalive {
        let sock = SockRef::from(socket);
        match config.keepalive_time {
            Some(time) => sock.set_tcp_keepalive(&TcpKeepalive::new().with_time(time))?,
            None => sock.set_keepalive(true)?,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    async fn connected_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server, _) = listener.accept().await.unwrap();
        (server, client)
    }

    #[tokio::test]
    async fn test_configure_socket_sets_options() {
        let (server, _client) = connected_pair().await;

        configure_socket(&server, &HubConfig::default()).unwrap();

        assert!(server.nodelay().unwrap());
        assert!(SockRef::from(&server).keepalive().unwrap());
    }

    #[tokio::test]
    async fn test_configure_socket_keepalive_time() {
        let (server, _client) = connected_pair().await;
        let config = HubConfig::default().keepalive_time(Duration::from_secs(30));

        configure_socket(&server, &config).unwrap();

        assert!(SockRef::from(&server).keepalive().unwrap());
    }

    #[tokio::test]
    async fn test_configure_socket_disabled_options() {
        let (server, _client) = connected_pair().await;
        let mut config = HubConfig::default().disable_keepalive();
        config.tcp_nodelay = false;

        configure_socket(&server, &config).unwrap();

        assert!(!server.nodelay().unwrap());
        assert!(!SockRef::from(&server).keepalive().unwrap());
    }
}
