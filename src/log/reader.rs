//! Log Reader
//!
//! Sequential, record-by-record reads of the data file.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use crate::error::{CaskError, Result};
use crate::format::{Header, Record, HEADER_SIZE};

/// A record together with the offset it was read from
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub offset: u64,
    pub record: Record,
}

/// Reads records from the start of the file up to a fixed end
///
/// The end is captured at open, so a scan taken while the store keeps
/// appending sees a stable prefix. Open a new reader to scan again.
pub struct LogReader {
    reader: BufReader<File>,
    /// Offset of the next record
    position: u64,
    /// Stop reading at this offset
    end: u64,
    /// Set once the iterator has yielded its last item
    done: bool,
}

impl LogReader {
    /// Open a reader over the whole file
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_bounded(path, u64::MAX)
    }

    /// Open a reader that stops at `end` (or at end of file, if sooner)
    pub fn open_bounded(path: &Path, end: u64) -> Result<Self> {
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();

        Ok(Self {
            reader: BufReader::new(file),
            position: 0,
            end: end.min(file_len),
            done: false,
        })
    }

    /// Read the next record and verify its checksum
    ///
    /// Returns:
    /// - `Ok(Some(entry))` - a complete record whose checksum verified
    /// - `Ok(None)` - clean end of the log
    /// - `Err(TruncatedRecord)` - the last record is only partially present
    /// - `Err(CorruptLog)` - a header that cannot be parsed; nothing after it
    ///   can be located
    /// - `Err(CorruptRecord)` - a complete record failed its checksum; the
    ///   reader has already moved past it, so the next call continues
    pub fn next_record(&mut self) -> Result<Option<LogEntry>> {
        let Some(entry) = self.next_unverified()? else {
            return Ok(None);
        };

        entry.record.check().map_err(|e| CaskError::CorruptRecord {
            offset: entry.offset,
            reason: e.to_string(),
        })?;

        Ok(Some(entry))
    }

    /// Read the next complete record without checking its checksum
    ///
    /// Only framing is validated: the header must parse and the record must
    /// fit before `end`. Replay uses this so a record that fails
    /// verification is still indexed and reads of its key report the mismatch.
    pub fn next_unverified(&mut self) -> Result<Option<LogEntry>> {
        if self.position >= self.end {
            return Ok(None);
        }

        let offset = self.position;
        let remaining = self.end - offset;

        if remaining < HEADER_SIZE as u64 {
            return Err(CaskError::TruncatedRecord { offset });
        }

        let mut header_buf = [0u8; HEADER_SIZE];
        self.read_exact_at(offset, &mut header_buf)?;

        let header = Header::decode(&header_buf).map_err(|e| CaskError::CorruptLog {
            offset,
            reason: e.to_string(),
        })?;

        if header.key_size == 0 {
            return Err(CaskError::CorruptLog {
                offset,
                reason: "record has an empty key".to_string(),
            });
        }

        let size = header.record_size();
        if size > remaining {
            return Err(CaskError::TruncatedRecord { offset });
        }

        let mut key = vec![0u8; header.key_size as usize + header.value_size as usize];
        self.read_exact_at(offset, &mut key)?;
        let value = key.split_off(header.key_size as usize);

        self.position += size;
        Ok(Some(LogEntry {
            offset,
            record: Record { header, key, value },
        }))
    }

    /// Offset of the next record (end of the readable prefix after a failure)
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        self.reader.read_exact(buf).map_err(|e| match e.kind() {
            // The file shrank underneath us after `end` was captured
            io::ErrorKind::UnexpectedEof => CaskError::TruncatedRecord { offset },
            _ => CaskError::Io(e),
        })
    }
}

impl Iterator for LogReader {
    type Item = Result<LogEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.next_record() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            // The bad record was skipped; later records are still reachable
            Err(e @ CaskError::CorruptRecord { .. }) => Some(Err(e)),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
