//! Counters for capture and broadcast
//!
//! Both sides update plain atomics from their own threads; readers take a
//! copy with `snapshot()` and never block the producer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Live counters for a frame source
#[derive(Debug)]
pub struct CaptureStats {
    started_at: Instant,
    frames_captured: AtomicU64,
    frames_skipped: AtomicU64,
    reconnects: AtomicU64,
}

impl CaptureStats {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            frames_captured: AtomicU64::new(0),
            frames_skipped: AtomicU64::new(0),
            reconnects: AtomicU64::new(0),
        }
    }

    pub(crate) fn record_frame(&self, evicted: bool) {
        self.frames_captured.fetch_add(1, Ordering::Relaxed);
        if evicted {
            self.frames_skipped.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_reconnect(&self) {
        self.reconnects.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the current values
    pub fn snapshot(&self) -> CaptureStatsSnapshot {
        CaptureStatsSnapshot {
            frames_captured: self.frames_captured.load(Ordering::Relaxed),
            frames_skipped: self.frames_skipped.load(Ordering::Relaxed),
            reconnects: self.reconnects.load(Ordering::Relaxed),
            uptime: self.started_at.elapsed(),
        }
    }
}

impl Default for CaptureStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time capture statistics
#[derive(Debug, Clone, Default)]
pub struct CaptureStatsSnapshot {
    /// Frames read off the source
    pub frames_captured: u64,
    /// Frames replaced before the consumer took them
    pub frames_skipped: u64,
    /// Failed open/read attempts followed by a reconnect
    pub reconnects: u64,
    /// Time since the source was created
    pub uptime: Duration,
}

impl CaptureStatsSnapshot {
    /// Average capture rate since start
    pub fn capture_fps(&self) -> f64 {
        let secs = self.uptime.as_secs_f64();
        if secs > 0.0 {
            self.frames_captured as f64 / secs
        } else {
            0.0
        }
    }
}

/// Live counters for the broadcast hub
#[derive(Debug, Default)]
pub struct HubStats {
    total_connections: AtomicU64,
    active_clients: AtomicU64,
    payloads_submitted: AtomicU64,
    payloads_enqueued: AtomicU64,
    payloads_dropped: AtomicU64,
    bytes_sent: AtomicU64,
}

impl HubStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_connected(&self) {
        self.total_connections.fetch_add(1, Ordering::Relaxed);
        self.active_clients.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_disconnected(&self) {
        self.active_clients.fetch_sub(1, Ordering::Relaxed);
    }

    pub(crate) fn record_submitted(&self) {
        self.payloads_submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_enqueued(&self) {
        self.payloads_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self) {
        self.payloads_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_sent(&self, bytes: usize) {
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Number of currently registered clients
    pub fn active_clients(&self) -> u64 {
        self.active_clients.load(Ordering::Relaxed)
    }

    /// Copy the current values
    pub fn snapshot(&self) -> HubStatsSnapshot {
        HubStatsSnapshot {
            total_connections: self.total_connections.load(Ordering::Relaxed),
            active_clients: self.active_clients.load(Ordering::Relaxed),
            payloads_submitted: self.payloads_submitted.load(Ordering::Relaxed),
            payloads_enqueued: self.payloads_enqueued.load(Ordering::Relaxed),
            payloads_dropped: self.payloads_dropped.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time hub statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HubStatsSnapshot {
    /// Connections accepted and registered since start
    pub total_connections: u64,
    /// Currently registered clients
    pub active_clients: u64,
    /// Payloads handed to `send`
    pub payloads_submitted: u64,
    /// Per-client queue inserts that succeeded
    pub payloads_enqueued: u64,
    /// Per-client queue inserts dropped because the queue was full
    pub payloads_dropped: u64,
    /// Bytes written and flushed to clients
    pub bytes_sent: u64,
}
