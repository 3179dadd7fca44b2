//! Broadcast hub configuration

use std::net::SocketAddr;
use std::time::Duration;

/// Port viewers connect to
pub const DEFAULT_PORT: u16 = 1337;

/// Per-client outbound queue capacity
pub const DEFAULT_QUEUE_CAPACITY: usize = 3;

/// Hub configuration options
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Payloads buffered per client before new ones are dropped (min 1)
    pub queue_capacity: usize,

    /// Enable TCP_NODELAY (disable Nagle's algorithm)
    pub tcp_nodelay: bool,

    /// Enable SO_KEEPALIVE so dead peers are eventually detected
    pub tcp_keepalive: bool,

    /// Idle time before the first keep-alive probe (None = OS default)
    pub keepalive_time: Option<Duration>,

    /// How long shutdown waits for client connections to close
    pub shutdown_timeout: Duration,

    /// Name of the hub thread
    pub thread_name: String,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            tcp_nodelay: true,
            tcp_keepalive: true,
            keepalive_time: None,
            shutdown_timeout: Duration::from_secs(1),
            thread_name: "broadcast-hub".to_string(),
        }
    }
}

impl HubConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the per-client queue capacity
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Set the keep-alive idle time
    pub fn keepalive_time(mut self, time: Duration) -> Self {
        self.tcp_keepalive = true;
        self.keepalive_time = Some(time);
        self
    }

    /// Disable TCP keep-alive probing
    pub fn disable_keepalive(mut self) -> Self {
        self.tcp_keepalive = false;
        self.keepalive_time = None;
        self
    }

    /// Set the shutdown grace period
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}
