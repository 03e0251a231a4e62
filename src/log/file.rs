//! Log File
//!
//! Owns the data file handle and the append cursor.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::{CaskError, Result};

/// Append-only data file with positioned reads
///
/// Every append is fsync'd before it returns. A failed append poisons the
/// handle: the cursor can no longer be trusted to match the file, so later
/// appends are refused until the store is reopened and replay re-derives it.
pub struct LogFile {
    path: PathBuf,
    /// `None` once closed
    file: Option<File>,
    /// Offset where the next record will start
    write_position: u64,
    poisoned: bool,
    locked: bool,
}

impl LogFile {
    /// Open or create the data file for append + read (never truncates)
    ///
    /// The cursor starts at the current end of file. With `lock` set, an
    /// exclusive advisory lock is taken and held until `close`.
    pub fn open(path: &Path, lock: bool) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)?;

        if lock {
            FileExt::try_lock_exclusive(&file)
                .map_err(|_| CaskError::Locked(path.to_path_buf()))?;
        }

        let write_position = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
            write_position,
            poisoned: false,
            locked: lock,
        })
    }

    /// Append bytes at the cursor and fsync; returns the start offset
    pub fn append(&mut self, data: &[u8]) -> Result<u64> {
        if self.poisoned {
            return Err(CaskError::LogPoisoned);
        }

        let offset = self.write_position;
        let file = self.file.as_mut().ok_or(CaskError::Closed)?;

        let written = file.write_all(data).and_then(|()| file.sync_all());
        if let Err(source) = written {
            self.poisoned = true;
            tracing::error!(
                path = %self.path.display(),
                offset,
                len = data.len(),
                "append failed, log writer poisoned: {}",
                source
            );
            return Err(CaskError::AppendFailed { offset, source });
        }

        self.write_position += data.len() as u64;
        Ok(offset)
    }

    /// Read exactly `len` bytes starting at `offset`
    pub fn read_at(&mut self, offset: u64, len: u64) -> Result<Vec<u8>> {
        let write_position = self.write_position;
        let file = self.file.as_mut().ok_or(CaskError::Closed)?;

        if offset.checked_add(len).map_or(true, |end| end > write_position) {
            return Err(CaskError::Read {
                offset,
                len,
                source: io::Error::new(io::ErrorKind::UnexpectedEof, "read past end of log"),
            });
        }

        file.seek(SeekFrom::Start(offset))
            .map_err(|source| CaskError::Seek { offset, source })?;

        let mut buf = vec![0u8; len as usize];
        file.read_exact(&mut buf)
            .map_err(|source| CaskError::Read { offset, len, source })?;

        Ok(buf)
    }

    /// Cut the file back to `len` bytes and move the cursor there
    ///
    /// Only used by recovery to drop an unfinished tail.
    pub fn truncate(&mut self, len: u64) -> Result<()> {
        let file = self.file.as_mut().ok_or(CaskError::Closed)?;
        file.set_len(len)?;
        file.sync_all()?;
        self.write_position = len;
        Ok(())
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        let file = self.file.as_ref().ok_or(CaskError::Closed)?;
        file.sync_all()?;
        Ok(())
    }

    /// Sync and release the handle; closing twice returns `Closed`
    pub fn close(&mut self) -> Result<()> {
        let file = self.file.take().ok_or(CaskError::Closed)?;
        let synced = file.sync_all();

        if self.locked {
            if let Err(e) = FileExt::unlock(&file) {
                tracing::warn!(path = %self.path.display(), "failed to release file lock: {}", e);
            }
        }

        synced?;
        Ok(())
    }

    pub fn write_position(&self) -> u64 {
        self.write_position
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }
}
