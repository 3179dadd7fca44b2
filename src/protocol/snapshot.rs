//! Grid snapshot encoding and line-based decoding

use bytes::{BufMut, Bytes, BytesMut};

/// Error type for snapshot construction and decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    /// A snapshot must have at least one non-empty row
    Empty,
    /// Row width differs from the first row
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
    /// Row contains a line terminator
    EmbeddedNewline { row: usize },
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotError::Empty => write!(f, "Snapshot has no rows"),
            SnapshotError::RaggedRow {
                row,
                expected,
                actual,
            } => write!(
                f,
                "Row {} is {} cells wide, expected {}",
                row, actual, expected
            ),
            SnapshotError::EmbeddedNewline { row } => {
                write!(f, "Row {} contains a line terminator", row)
            }
        }
    }
}

impl std::error::Error for SnapshotError {}

/// One game-state grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    rows: Vec<String>,
}

impl Snapshot {
    /// Build a snapshot from grid rows
    ///
    /// Rows must be non-empty, equally wide (in chars) and free of `\n`/`\r`.
    pub fn new<I, S>(rows: I) -> Result<Self, SnapshotError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rows: Vec<String> = rows.into_iter().map(Into::into).collect();

        let expected = match rows.first() {
            Some(first) if !first.is_empty() => first.chars().count(),
            _ => return Err(SnapshotError::Empty),
        };

        for (row, text) in rows.iter().enumerate() {
            if text.contains(['\n', '\r']) {
                return Err(SnapshotError::EmbeddedNewline { row });
            }
            let actual = text.chars().count();
            if actual != expected {
                return Err(SnapshotError::RaggedRow {
                    row,
                    expected,
                    actual,
                });
            }
        }

        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    /// Grid width in cells
    pub fn width(&self) -> usize {
        self.rows[0].chars().count()
    }

    /// Grid height in rows
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Cell at (x, y), if inside the grid
    pub fn cell(&self, x: usize, y: usize) -> Option<char> {
        self.rows.get(y).and_then(|row| row.chars().nth(x))
    }

    /// Wire encoding: each row plus `\n`, then one empty line
    pub fn encode(&self) -> Bytes {
        let len = self.rows.iter().map(|r| r.len() + 1).sum::<usize>() + 1;
        let mut buf = BytesMut::with_capacity(len);
        for row in &self.rows {
            buf.put_slice(row.as_bytes());
            buf.put_u8(b'\n');
        }
        buf.put_u8(b'\n');
        buf.freeze()
    }
}

impl std::fmt::Display for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in &self.rows {
            writeln!(f, "{}", row)?;
        }
        Ok(())
    }
}

/// Reassembles snapshots from received lines
///
/// Feed lines with their terminator already stripped. An empty line closes
/// the snapshot being collected.
#[derive(Debug, Default)]
pub struct SnapshotDecoder {
    pending: Vec<String>,
}

impl SnapshotDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push one line; returns a snapshot when `line` is the record separator
    ///
    /// Separators with no rows before them are ignored.
    pub fn push_line(&mut self, line: &str) -> Option<Result<Snapshot, SnapshotError>> {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if !line.is_empty() {
            self.pending.push(line.to_string());
            return None;
        }

        if self.pending.is_empty() {
            return None;
        }

        Some(Snapshot::new(std::mem::take(&mut self.pending)))
    }

    /// Rows received since the last separator
    pub fn pending_rows(&self) -> usize {
        self.pending.len()
    }
}
