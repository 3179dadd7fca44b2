//! Crate-level error type
//!
//! Only the setup APIs (starting the hub, starting capture, connecting a
//! viewer) return errors. Faults after startup are absorbed by the component
//! that owns them and show up in logs and stats instead.

use std::fmt;
use std::io;

use crate::capture::CaptureError;
use crate::protocol::SnapshotError;

/// Result alias used by the fallible setup APIs
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error
#[derive(Debug)]
pub enum Error {
    /// Socket, thread or runtime setup failed
    Io(io::Error),
    /// Frame capture could not be started
    Capture(CaptureError),
    /// A received snapshot was malformed
    Snapshot(SnapshotError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Capture(e) => write!(f, "Capture error: {}", e),
            Error::Snapshot(e) => write!(f, "Snapshot error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Capture(e) => Some(e),
            Error::Snapshot(e) => Some(e),
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<CaptureError> for Error {
    fn from(e: CaptureError) -> Self {
        Error::Capture(e)
    }
}

impl From<SnapshotError> for Error {
    fn from(e: SnapshotError) -> Self {
        Error::Snapshot(e)
    }
}
