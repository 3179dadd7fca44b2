//! Video frame acquisition
//!
//! A dedicated worker thread keeps a connection to the video source open,
//! reconnecting after any failure, and writes every decoded frame into a
//! single-slot buffer. The consumer always gets the newest frame; frames it
//! was too slow to take are silently replaced.
//!
//! ```text
//!   StreamOpener::open(url) ──► FrameReader::read_frame() ──► LatestFrameSlot::push
//!          ▲                              │ error                     │
//!          └────── sleep(reconnect_delay) ┘                  FrameSource::pop_frame
//! ```

pub mod config;
pub mod error;
pub mod ffmpeg;
pub mod frame;
pub mod slot;
pub mod source;

pub use config::{FrameSourceConfig, Resolution};
pub use error::CaptureError;
pub use ffmpeg::{FfmpegOpener, FfmpegReader};
pub use frame::Frame;
pub use slot::LatestFrameSlot;
pub use source::{FrameReader, FrameSource, StreamOpener};
