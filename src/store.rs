//! Store Module
//!
//! The storage engine that coordinates the log and the KeyDir.
//!
//! ## Responsibilities
//! - Replay the log into the KeyDir on open
//! - Serve point reads with one seek + one read, verified by checksum
//! - Turn sets and deletes into appended records
//! - Mask expired and deleted keys at read time

use std::path::Path;
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{CaskError, Result};
use crate::format::{now_secs, Record, Value};
use crate::keydir::{KeyDir, KeyEntry};
use crate::log::{LogFile, LogReader, LogRecovery, RecoveryResult};

/// A single-file, log-structured key-value store
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes** (set/delete): serialized by the `log` mutex
///   - The KeyDir is updated while the mutex is still held, so the append
///     cursor and the index always move together
///
/// - **Reads** (get): take the `log` mutex for the seek + read, with the
///   `KeyEntry` copied out of the KeyDir's RwLock beforehand
///   - Decoding and verification happen after the mutex is released
///   - `list_keys` only touches the KeyDir and never waits on disk I/O
///
/// Only one `Store` may own a data file at a time. Set `Config::lock_file`
/// to enforce that across processes.
pub struct Store {
    /// Store configuration
    config: Config,

    /// The data file (exclusive access needed for the cursor)
    log: Mutex<LogFile>,

    /// In-memory index (internal RwLock)
    keydir: KeyDir,

    /// Stats from the replay that opened this store
    recovery: RecoveryResult,
}

impl Store {
    /// Open or create a store with the given config
    ///
    /// On startup:
    /// 1. Open/create the data file (and lock it if configured)
    /// 2. Replay it into a fresh KeyDir
    /// 3. Drop or reject an unfinished tail, per `recovery_mode`
    /// 4. Ready to serve requests
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        let mut log = LogFile::open(&config.path, config.lock_file)?;
        let keydir = KeyDir::new();

        let recovery = LogRecovery::recover(&mut log, config.recovery_mode, &keydir)?;

        tracing::info!(
            path = %config.path.display(),
            records = recovery.records_replayed,
            tombstones = recovery.tombstones,
            corrupt = recovery.corrupt_records,
            keys = keydir.len(),
            bytes = log.write_position(),
            "store opened"
        );

        Ok(Self {
            config,
            log: Mutex::new(log),
            keydir,
            recovery,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data file
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let config = Config::builder().path(path.as_ref()).build();
        Self::open(config)
    }

    /// Get the value for a key
    ///
    /// Missing, deleted and expired keys all report `KeyNotFound`. A record
    /// that fails its checksum is never returned.
    pub fn get(&self, key: &[u8]) -> Result<Value> {
        let (offset, data) = {
            let mut log = self.log.lock();
            if !log.is_open() {
                return Err(CaskError::Closed);
            }

            // Step 1: Copy the index entry out (read lock released immediately)
            let entry = self.keydir.get(key).ok_or(CaskError::KeyNotFound)?;

            // Step 2: One seek + one read
            (entry.offset, log.read_at(entry.offset, entry.size)?)
        };

        // Step 3: Decode and verify
        let record = Record::decode(&data)?;
        record.check()?;

        if record.key != key {
            return Err(CaskError::Decoding(format!(
                "record at offset {} belongs to a different key",
                offset
            )));
        }

        // Step 4: Mask expired and deleted keys
        if record.header.is_expired_at(now_secs()) {
            tracing::trace!(offset, "key expired");
            return Err(CaskError::KeyNotFound);
        }
        if record.is_tombstone() {
            return Err(CaskError::KeyNotFound);
        }

        record.value()
    }

    /// Set a key-value pair that never expires
    pub fn set(&self, key: &[u8], value: impl Into<Value>) -> Result<()> {
        self.write(key, &value.into(), 0)
    }

    /// Set a key-value pair that reads as absent once `ttl` has passed
    pub fn set_with_expiry(&self, key: &[u8], value: impl Into<Value>, ttl: Duration) -> Result<()> {
        let expiry = now_secs().saturating_add(u32::try_from(ttl.as_secs()).unwrap_or(u32::MAX));
        self.write(key, &value.into(), expiry.max(1))
    }

    /// Delete a key
    ///
    /// Appends a tombstone and points the KeyDir at it, so replay after a
    /// restart still resolves the key to "deleted". Deleting a key that is
    /// absent or already deleted is a no-op.
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        self.validate_key(key)?;

        let mut log = self.log.lock();
        if !log.is_open() {
            return Err(CaskError::Closed);
        }

        match self.keydir.get(key) {
            Some(entry) if !entry.tombstone => {}
            _ => {
                tracing::trace!("delete of absent key skipped");
                return Ok(());
            }
        }

        let record = Record::tombstone(key, now_secs())?;
        let encoded = record.encode()?;
        let offset = log.append(&encoded)?;

        self.keydir
            .insert(key.to_vec(), KeyEntry::from_header(&record.header, offset));

        tracing::debug!(offset, "tombstone appended");
        Ok(())
    }

    /// Snapshot of keys that are neither deleted nor expired (unordered)
    pub fn list_keys(&self) -> Vec<Vec<u8>> {
        self.keydir.live_keys(now_secs())
    }

    /// Lazily scan every record written so far, oldest first
    ///
    /// Each call re-opens the file, so the sequence can be restarted by
    /// calling `scan` again. Records appended after the call are not seen.
    /// A record that fails its checksum is yielded as `CorruptRecord` and the
    /// scan carries on with the next one.
    pub fn scan(&self) -> Result<LogReader> {
        let log = self.log.lock();
        if !log.is_open() {
            return Err(CaskError::Closed);
        }
        LogReader::open_bounded(log.path(), log.write_position())
    }

    /// Force sync to disk
    pub fn sync(&self) -> Result<()> {
        self.log.lock().sync()
    }

    /// Close the store
    ///
    /// Syncs and releases the data file. Later operations fail with
    /// `Closed`, and so does a second close.
    pub fn close(&self) -> Result<()> {
        let mut log = self.log.lock();
        log.close()?;
        self.keydir.clear();

        tracing::info!(path = %self.config.path.display(), "store closed");
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.keydir.live_count(now_secs())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the data file path
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Offset where the next record will be written (= valid log length)
    pub fn write_position(&self) -> u64 {
        self.log.lock().write_position()
    }

    /// Stats from the replay performed by `open`
    pub fn recovery(&self) -> &RecoveryResult {
        &self.recovery
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Validate, encode, append, index. `expiry` is absolute (0 = never).
    fn write(&self, key: &[u8], value: &Value, expiry: u32) -> Result<()> {
        self.validate_key(key)?;

        let value_len = value.encoded_len();
        if value_len > self.config.max_value_size as usize {
            return Err(CaskError::ValueTooLarge {
                size: value_len,
                max: self.config.max_value_size,
            });
        }

        let record = Record::new(key, value, now_secs(), expiry)?;
        let encoded = record.encode()?;

        let mut log = self.log.lock();
        if !log.is_open() {
            return Err(CaskError::Closed);
        }
        let offset = log.append(&encoded)?;

        // Still under the log lock: cursor and index move together
        self.keydir
            .insert(key.to_vec(), KeyEntry::from_header(&record.header, offset));

        tracing::trace!(offset, size = encoded.len(), "record appended");
        Ok(())
    }

    fn validate_key(&self, key: &[u8]) -> Result<()> {
        if key.is_empty() {
            return Err(CaskError::EmptyKey);
        }
        if key.len() > self.config.max_key_size as usize {
            return Err(CaskError::KeyTooLarge {
                size: key.len(),
                max: self.config.max_key_size,
            });
        }
        Ok(())
    }
}
