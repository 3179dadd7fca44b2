//! Viewer-side client
//!
//! Connects to a broadcast hub and yields the snapshots it sends.

pub mod viewer;

pub use viewer::Viewer;
