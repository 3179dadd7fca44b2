//! Snapshot viewer
//!
//! Reads the hub's line stream and reassembles snapshots, the same thing
//! `nc <host> 1337` shows a person.

use std::net::SocketAddr;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};
use tokio::net::{TcpStream, ToSocketAddrs};

use crate::error::Result;
use crate::protocol::{Snapshot, SnapshotDecoder};

/// Reads snapshots from a broadcast hub
///
/// # Example
/// ```no_run
/// use mazecast::Viewer;
///
/// # async fn example() -> mazecast::Result<()> {
/// let mut viewer = Viewer::connect("maze.devbit.lan:1337").await?;
/// while let Some(snapshot) = viewer.next_snapshot().await? {
///     println!("{}", snapshot);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Viewer<R = TcpStream> {
    lines: Lines<BufReader<R>>,
    decoder: SnapshotDecoder,
    peer_addr: Option<SocketAddr>,
}

impl Viewer<TcpStream> {
    /// Connect to a hub
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        let peer_addr = stream.peer_addr().ok();
        tracing::debug!(peer = ?peer_addr, "Viewer connected");

        let mut viewer = Self::new(stream);
        viewer.peer_addr = peer_addr;
        Ok(viewer)
    }
}

impl<R: AsyncRead + Unpin> Viewer<R> {
    /// Read snapshots from any byte stream
    pub fn new(reader: R) -> Self {
        Self {
            lines: BufReader::new(reader).lines(),
            decoder: SnapshotDecoder::new(),
            peer_addr: None,
        }
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    /// Next raw line without its terminator, `None` at end of stream
    pub async fn next_line(&mut self) -> Result<Option<String>> {
        Ok(self.lines.next_line().await?)
    }

    /// Next complete snapshot, `None` once the hub closes the connection
    ///
    /// Rows of a snapshot cut off by the close are discarded.
    pub async fn next_snapshot(&mut self) -> Result<Option<Snapshot>> {
        while let Some(line) = self.lines.next_line().await? {
            if let Some(snapshot) = self.decoder.push_line(&line) {
                return Ok(Some(snapshot?));
            }
        }

        if self.decoder.pending_rows() > 0 {
            tracing::debug!(rows = self.decoder.pending_rows(), "Incomplete snapshot at close");
        }
        Ok(None)
    }
}
