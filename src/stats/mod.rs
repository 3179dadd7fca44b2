//! Statistics for capture and broadcast

pub mod metrics;

pub use metrics::{CaptureStats, CaptureStatsSnapshot, HubStats, HubStatsSnapshot};
