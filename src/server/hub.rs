//! Broadcast hub
//!
//! The hub owns a dedicated thread running a current-thread tokio runtime.
//! Callers on any other thread talk to it only by submitting commands over an
//! unbounded channel; the fan-out itself always runs on the hub thread.

use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tokio::net::TcpListener;
use tokio::sync::mpsc;

use super::config::HubConfig;
use super::listener::HubServer;
use super::payload::{ClientId, Payload};
use crate::error::Result;
use crate::stats::{HubStats, HubStatsSnapshot};

/// Work submitted to the hub thread
#[derive(Debug)]
pub(crate) enum HubCommand {
    /// Queue a payload for every active client
    Broadcast(Payload),
    /// A connection's send loop ended
    Unregister(ClientId),
    /// Stop accepting and close all clients
    Shutdown,
}

/// Cloneable, thread-safe handle for submitting payloads
#[derive(Debug, Clone)]
pub struct HubHandle {
    commands: mpsc::UnboundedSender<HubCommand>,
    local_addr: SocketAddr,
    stats: Arc<HubStats>,
}

impl HubHandle {
    /// Broadcast a payload to every connected viewer
    ///
    /// Never blocks and never fails: viewers whose queue is full miss this
    /// payload, and if the hub has stopped the payload is discarded.
    pub fn send(&self, payload: impl Into<Payload>) {
        let payload = payload.into();
        self.stats.record_submitted();

        if self.commands.send(HubCommand::Broadcast(payload)).is_err() {
            tracing::debug!("Broadcast hub stopped, payload discarded");
        }
    }

    /// Address the hub is listening on
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Number of active clients
    pub fn client_count(&self) -> usize {
        self.stats.active_clients() as usize
    }

    pub fn stats(&self) -> HubStatsSnapshot {
        self.stats.snapshot()
    }

    /// Whether the hub thread is still accepting commands
    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }

    fn request_shutdown(&self) {
        let _ = self.commands.send(HubCommand::Shutdown);
    }
}

/// TCP broadcast server for game-state snapshots
///
/// # Example
/// ```no_run
/// use mazecast::{BroadcastHub, HubConfig};
///
/// # fn example() -> mazecast::Result<()> {
/// let hub = BroadcastHub::start(HubConfig::default())?;
/// hub.send("#####\n#F G#\n#####\n\n");
/// # Ok(())
/// # }
/// ```
pub struct BroadcastHub {
    handle: HubHandle,
    thread: Option<JoinHandle<()>>,
}

impl BroadcastHub {
    /// Bind the listener and start the hub thread
    ///
    /// Binding happens on the calling thread, so an unavailable port is
    /// reported here rather than logged from the hub thread.
    pub fn start(config: HubConfig) -> Result<Self> {
        let std_listener = std::net::TcpListener::bind(config.bind_addr)?;
        std_listener.set_nonblocking(true)?;
        let local_addr = std_listener.local_addr()?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let stats = Arc::new(HubStats::new());
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let server = HubServer::new(
            config.clone(),
            command_rx,
            command_tx.clone(),
            Arc::clone(&stats),
        );

        let thread = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || {
                runtime.block_on(async move {
                    match TcpListener::from_std(std_listener) {
                        Ok(listener) => server.run(listener).await,
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to register listener");
                        }
                    }
                });
                tracing::info!("Broadcast hub stopped");
            })?;

        tracing::info!(addr = %local_addr, "Broadcast hub listening");

        Ok(Self {
            handle: HubHandle {
                commands: command_tx,
                local_addr,
                stats,
            },
            thread: Some(thread),
        })
    }

    /// Broadcast a payload to every connected viewer
    pub fn send(&self, payload: impl Into<Payload>) {
        self.handle.send(payload);
    }

    /// Handle for sending from other threads
    pub fn handle(&self) -> HubHandle {
        self.handle.clone()
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.handle.local_addr()
    }

    pub fn client_count(&self) -> usize {
        self.handle.client_count()
    }

    pub fn stats(&self) -> HubStatsSnapshot {
        self.handle.stats()
    }

    /// Stop accepting, close every client and wait for the hub thread
    pub fn shutdown(mut self) {
        self.handle.request_shutdown();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("Broadcast hub thread panicked");
            }
        }
    }
}

impl Drop for BroadcastHub {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.handle.request_shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use tokio::io::AsyncReadExt;
    use tokio::net::TcpStream;

    use super::*;

    fn local_config() -> HubConfig {
        HubConfig::with_addr(SocketAddr::from(([127, 0, 0, 1], 0)))
    }

    async fn wait_for_clients(hub: &BroadcastHub, count: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while hub.client_count() != count {
            assert!(Instant::now() < deadline, "timed out waiting for {} clients", count);
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[test]
    fn test_bind_conflict_reported() {
        let hub = BroadcastHub::start(local_config()).unwrap();

        let result = BroadcastHub::start(HubConfig::with_addr(hub.local_addr()));
        assert!(matches!(result, Err(crate::Error::Io(_))));

        hub.shutdown();
    }

    #[tokio::test]
    async fn test_send_from_foreign_thread() {
        let hub = BroadcastHub::start(local_config()).unwrap();
        let mut client = TcpStream::connect(hub.local_addr()).await.unwrap();
        wait_for_clients(&hub, 1).await;

        let handle = hub.handle();
        std::thread::spawn(move || handle.send("hello\n"))
            .join()
            .unwrap();

        let mut buf = [0u8; 6];
        client.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"hello\n");

        hub.shutdown();
    }

    #[tokio::test]
    async fn test_disconnect_unregisters() {
        let hub = BroadcastHub::start(local_config()).unwrap();
        let client = TcpStream::connect(hub.local_addr()).await.unwrap();
        wait_for_clients(&hub, 1).await;

        drop(client);

        // The dead peer is only noticed on write
        let deadline = Instant::now() + Duration::from_secs(5);
        while hub.client_count() != 0 {
            assert!(Instant::now() < deadline, "client never unregistered");
            hub.send("ping\n");
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        assert_eq!(hub.stats().total_connections, 1);
        hub.shutdown();
    }

    #[tokio::test]
    async fn test_shutdown_closes_clients() {
        let hub = BroadcastHub::start(local_config()).unwrap();
        let mut client = TcpStream::connect(hub.local_addr()).await.unwrap();
        wait_for_clients(&hub, 1).await;
        let handle = hub.handle();

        tokio::task::spawn_blocking(move || hub.shutdown())
            .await
            .unwrap();

        let mut buf = Vec::new();
        let read = tokio::time::timeout(Duration::from_secs(5), client.read_to_end(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(read, 0);
        assert!(!handle.is_running());

        // Sending after shutdown is harmless
        handle.send("late\n");
    }
}
