//! mazecast
//!
//! Real-time plumbing for a camera-overlay maze game:
//!
//! - [`capture`]: a reconnecting video capture worker that always hands the
//!   consumer the freshest decoded frame and never blocks on a slow consumer
//! - [`server`]: a TCP broadcast hub that fans game-state snapshots out to any
//!   number of viewers, each with its own small bounded queue
//! - [`protocol`]: the line-oriented snapshot wire format
//! - [`client`]: a viewer that reads snapshots back off the wire
//!
//! # Architecture
//!
//! ```text
//!   ffmpeg ──► capture worker ──► LatestFrameSlot ──► pop_frame()   (driver)
//!                                                          │
//!                                                       send()
//!                                                          │
//!                         hub thread (current-thread runtime)
//!                  ┌──────────────────────────────────────────────┐
//!                  │ commands ──► BroadcastState ──► try_send ──► │──► client queue ──► TCP
//!                  │                                 try_send ──► │──► client queue ──► TCP
//!                  └──────────────────────────────────────────────┘
//! ```

pub mod capture;
pub mod client;
pub mod error;
pub mod protocol;
pub mod server;
pub mod stats;

pub use capture::{Frame, FrameSource, FrameSourceConfig};
pub use client::Viewer;
pub use error::{Error, Result};
pub use protocol::{Snapshot, SnapshotDecoder};
pub use server::{BroadcastHub, HubConfig, HubHandle, Payload};
