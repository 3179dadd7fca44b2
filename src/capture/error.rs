//! Capture error types

use std::io;

/// Error type for capture operations
///
/// The worker treats every open or read error the same way: it logs it,
/// waits out the reconnect delay and opens the source again.
#[derive(Debug)]
pub enum CaptureError {
    /// The source could not be opened
    OpenFailed { url: String, reason: String },
    /// ffmpeg executable not found
    FfmpegNotFound,
    /// Failed to spawn the decoder process
    SpawnFailed(io::Error),
    /// The source stopped producing frames
    StreamEnded,
    /// Reading a frame failed
    ReadFailed(io::Error),
    /// `start()` was called on a running source
    AlreadyStarted,
}

impl std::fmt::Display for CaptureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureError::OpenFailed { url, reason } => {
                write!(f, "Could not open {}: {}", url, reason)
            }
            CaptureError::FfmpegNotFound => write!(f, "ffmpeg not found"),
            CaptureError::SpawnFailed(e) => write!(f, "Failed to spawn decoder: {}", e),
            CaptureError::StreamEnded => write!(f, "Stream ended"),
            CaptureError::ReadFailed(e) => write!(f, "Bad frame: {}", e),
            CaptureError::AlreadyStarted => write!(f, "Frame source already started"),
        }
    }
}

impl std::error::Error for CaptureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CaptureError::SpawnFailed(e) | CaptureError::ReadFailed(e) => Some(e),
            _ => None,
        }
    }
}
