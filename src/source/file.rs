//! File-based transport.
//!
//! Tails an append-only file, yielding one payload per line.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{Poll, Transport};
use crate::error::TransportError;

/// A transport that follows a growing file, like `tail -f`.
///
/// By default only lines appended after the file is first opened are
/// returned; [`FileTail::from_start`] replays existing content too. A file
/// that does not exist yet is waited for (and then read from its start).
/// A file that shrinks below the read offset (truncated or replaced) is
/// reopened and read from the beginning. Incomplete trailing lines are
/// held back until their newline arrives. Tailing never ends on its own.
#[derive(Debug)]
pub struct FileTail {
    path: PathBuf,
    description: String,
    reader: Option<BufReader<File>>,
    /// Bytes consumed from the current file.
    offset: u64,
    /// Bytes of the line being assembled.
    line: Vec<u8>,
    from_start: bool,
    closed: bool,
}

impl FileTail {
    /// Create a new file tail for the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self {
            path,
            description,
            reader: None,
            offset: 0,
            line: Vec::new(),
            from_start: false,
            closed: false,
        }
    }

    /// Read lines already present when the file is opened.
    pub fn from_start(mut self, from_start: bool) -> Self {
        self.from_start = from_start;
        self
    }

    /// Returns the path being tailed.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens the file if it exists. Returns false if it does not exist yet.
    fn open(&mut self) -> Result<bool, TransportError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                // Whatever gets written once it appears is new to us.
                self.from_start = true;
                return Ok(false);
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let mut reader = BufReader::new(file);
        self.offset = if self.from_start {
            0
        } else {
            reader.seek(SeekFrom::End(0)).map_err(|e| self.io_error(e))?
        };
        debug!(path = %self.path.display(), offset = self.offset, "opened file for tailing");
        self.reader = Some(reader);
        Ok(true)
    }

    /// Reopen from the start if the file is now shorter than what we read.
    /// Returns true if the file was reopened.
    fn check_truncated(&mut self) -> Result<bool, TransportError> {
        let len = match fs::metadata(&self.path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(self.io_error(e)),
        };

        if len < self.offset {
            warn!(
                path = %self.path.display(),
                len,
                offset = self.offset,
                "file shrank, reading again from the start"
            );
            self.reader = None;
            self.line.clear();
            self.from_start = true;
            return self.open();
        }
        Ok(false)
    }

    fn io_error(&self, error: io::Error) -> TransportError {
        TransportError::io(self.description.clone(), error)
    }
}

impl Transport for FileTail {
    fn next(&mut self) -> Result<Poll, TransportError> {
        if self.closed {
            return Ok(Poll::End);
        }
        if self.reader.is_none() && !self.open()? {
            return Ok(Poll::Pending);
        }

        loop {
            let Some(reader) = self.reader.as_mut() else {
                return Ok(Poll::Pending);
            };

            let read = match reader.read_until(b'\n', &mut self.line) {
                Ok(read) => read,
                Err(e) => return Err(self.io_error(e)),
            };
            self.offset += read as u64;

            if read == 0 {
                if self.check_truncated()? {
                    continue;
                }
                return Ok(Poll::Pending);
            }
            if self.line.last() != Some(&b'\n') {
                // Writer is mid-line; keep the fragment for the next pull.
                return Ok(Poll::Pending);
            }

            let mut payload = std::mem::take(&mut self.line);
            while matches!(payload.last(), Some(b'\n' | b'\r')) {
                payload.pop();
            }
            if payload.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            return Ok(Poll::Payload(payload));
        }
    }

    fn close(&mut self) {
        self.reader = None;
        self.line.clear();
        self.closed = true;
    }

    fn description(&self) -> &str {
        &self.description
    }
}
