//! Append-only edge log.
//!
//! Each edge is one JSON object followed by `\n`. The recorder holds the log
//! open for its whole lifetime and flushes after every append and on drop.

use crate::edge::SocialGraphEdge;
use crate::error::{Error, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use tracing::{debug, warn};

/// Writer that appends edges to a log sink.
///
/// Generic over the sink so that the same code path writes to a file in
/// production and to memory in tests.
pub struct GraphRecorder<W: Write = File> {
    sink: W,
    appended: u64,
}

impl GraphRecorder<File> {
    /// Open or create the log at `path` in append mode.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())?;
        debug!("Opened graph log at {:?}", path.as_ref());
        Ok(Self::new(file))
    }
}

impl<W: Write> GraphRecorder<W> {
    /// Wrap an already opened sink.
    pub fn new(sink: W) -> Self {
        Self { sink, appended: 0 }
    }

    /// Append one edge as a single line and flush it.
    pub fn append(&mut self, edge: &SocialGraphEdge) -> Result<()> {
        let mut line = serde_json::to_vec(edge)?;
        line.push(b'\n');

        // Record and separator go out in a single write.
        self.sink.write_all(&line)?;
        self.sink.flush()?;
        self.appended += 1;
        Ok(())
    }

    /// Number of edges appended through this recorder.
    pub fn appended(&self) -> u64 {
        self.appended
    }

    /// Borrow the underlying sink.
    pub fn get_ref(&self) -> &W {
        &self.sink
    }
}

impl<W: Write> Drop for GraphRecorder<W> {
    fn drop(&mut self) {
        if let Err(e) = self.sink.flush() {
            warn!("Failed to flush graph log on close: {}", e);
        }
    }
}

/// Read every edge from `reader` in append order.
///
/// A final line that does not end in a newline and fails to decode is the
/// remains of an interrupted write and is skipped. Any other malformed line
/// is reported as [`Error::Corrupt`].
pub fn read_edges<R: BufRead>(mut reader: R) -> Result<Vec<SocialGraphEdge>> {
    let mut edges = Vec::new();
    let mut buf = Vec::new();
    let mut line_no = 0;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_no += 1;

        let terminated = buf.ends_with(b"\n");
        match decode_line(&buf) {
            Ok(Some(edge)) => edges.push(edge),
            Ok(None) => {}
            Err(reason) if !terminated => {
                warn!("Skipping partial trailing edge on line {}: {}", line_no, reason);
            }
            Err(reason) => {
                return Err(Error::Corrupt {
                    line: line_no,
                    reason,
                })
            }
        }
    }

    Ok(edges)
}

/// Decode one raw log line. Blank lines yield `None`.
fn decode_line(raw: &[u8]) -> std::result::Result<Option<SocialGraphEdge>, String> {
    let line = std::str::from_utf8(raw).map_err(|e| format!("invalid UTF-8: {}", e))?;
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(line).map(Some).map_err(|e| e.to_string())
}

/// Read the log file at `path`.
pub fn read_log<P: AsRef<Path>>(path: P) -> Result<Vec<SocialGraphEdge>> {
    let file = File::open(path)?;
    read_edges(BufReader::new(file))
}
