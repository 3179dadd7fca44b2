//! Snapshot wire format
//!
//! Viewers receive plain UTF-8 text. One snapshot is a fixed-width grid, one
//! newline-terminated row per line, followed by an empty line:
//!
//! ```text
//! #############S#######\n
//! #F  #   #    G    # #\n
//! ...
//! #############E#######\n
//! \n
//! ```
//!
//! A line-based reader ends a snapshot at the first zero-length line.

pub mod snapshot;

pub use snapshot::{Snapshot, SnapshotDecoder, SnapshotError};
