//! Log Recovery
//!
//! Rebuilds the KeyDir on startup by replaying the log from offset 0.

use std::path::Path;

use crate::config::RecoveryMode;
use crate::error::{CaskError, Result};
use crate::keydir::{KeyDir, KeyEntry};

use super::{LogFile, LogReader};

/// Replays the log into a KeyDir
pub struct LogRecovery;

/// Result of a recovery operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of complete records replayed, corrupt ones included
    pub records_replayed: u64,

    /// How many of those were tombstones
    pub tombstones: u64,

    /// Complete records that failed checksum verification (still indexed)
    pub corrupt_records: u64,

    /// Length of the readable prefix of the log
    pub valid_length: u64,

    /// Bytes past the valid prefix that were (or would be) dropped
    pub discarded_bytes: u64,

    /// Whether the log ended in an unusable record
    pub was_truncated: bool,
}

/// Where and why a replay stopped before end of file
struct BadTail {
    offset: u64,
    reason: String,
}

/// Outcome of one pass over the log
struct Replay {
    result: RecoveryResult,
    /// Offset of the first record that failed its checksum
    first_corrupt: Option<u64>,
    bad_tail: Option<BadTail>,
}

impl LogRecovery {
    /// Replay `log` into `keydir`
    ///
    /// This will:
    /// 1. Read every record in append order
    /// 2. Point each record's key at its offset (tombstones included, so a
    ///    delete keeps shadowing older records across restarts)
    /// 3. Index records that fail their checksum too, so `get` reports the
    ///    mismatch instead of an older value or a missing key
    /// 4. Stop at a record that runs past end of file or whose header cannot
    ///    be parsed, and depending on `mode` cut the file back to it or fail
    ///    with `CorruptLog`
    ///
    /// `Strict` also refuses a log holding any corrupt record. It never
    /// modifies the file.
    ///
    /// Blocking, O(file size).
    pub fn recover(log: &mut LogFile, mode: RecoveryMode, keydir: &KeyDir) -> Result<RecoveryResult> {
        let file_len = log.write_position();
        let mut reader = LogReader::open_bounded(log.path(), file_len)?;

        let Replay {
            mut result,
            first_corrupt,
            bad_tail,
        } = Self::replay(&mut reader, Some(keydir))?;
        result.valid_length = reader.position();

        if mode == RecoveryMode::Strict {
            if let Some(offset) = first_corrupt {
                return Err(CaskError::CorruptLog {
                    offset,
                    reason: "record failed checksum verification".to_string(),
                });
            }
        }

        if result.corrupt_records > 0 {
            tracing::warn!(
                path = %log.path().display(),
                corrupt = result.corrupt_records,
                "log holds records that fail verification; reads of those keys will report it"
            );
        }

        if let Some(tail) = bad_tail {
            match mode {
                RecoveryMode::Strict => {
                    return Err(CaskError::CorruptLog {
                        offset: tail.offset,
                        reason: tail.reason,
                    });
                }
                RecoveryMode::TruncateTail => {
                    result.discarded_bytes = file_len - tail.offset;
                    result.was_truncated = true;

                    tracing::warn!(
                        path = %log.path().display(),
                        offset = tail.offset,
                        discarded = result.discarded_bytes,
                        "dropping unfinished tail of log: {}",
                        tail.reason
                    );

                    log.truncate(tail.offset)?;
                }
            }
        }

        Ok(result)
    }

    /// Verify integrity of a log file without modifying it
    pub fn verify(path: &Path) -> Result<RecoveryResult> {
        let mut reader = LogReader::open(path)?;
        let Replay {
            mut result,
            bad_tail,
            ..
        } = Self::replay(&mut reader, None)?;

        result.valid_length = reader.position();
        if let Some(tail) = bad_tail {
            result.discarded_bytes = reader.end() - tail.offset;
            result.was_truncated = true;
        }

        Ok(result)
    }

    fn replay(reader: &mut LogReader, keydir: Option<&KeyDir>) -> Result<Replay> {
        let mut result = RecoveryResult::default();
        let mut first_corrupt = None;

        let bad_tail = loop {
            match reader.next_unverified() {
                Ok(Some(entry)) => {
                    let record = entry.record;
                    if !record.verify() {
                        tracing::warn!(offset = entry.offset, "record failed checksum verification");
                        result.corrupt_records += 1;
                        first_corrupt.get_or_insert(entry.offset);
                    }
                    if record.is_tombstone() {
                        result.tombstones += 1;
                    }
                    if let Some(keydir) = keydir {
                        let key_entry = KeyEntry::from_header(&record.header, entry.offset);
                        keydir.insert(record.key, key_entry);
                    }
                    result.records_replayed += 1;
                }
                Ok(None) => break None,
                Err(CaskError::TruncatedRecord { offset }) => {
                    let reason = "record extends past end of file".to_string();
                    break Some(BadTail { offset, reason });
                }
                Err(CaskError::CorruptLog { offset, reason }) => {
                    break Some(BadTail { offset, reason });
                }
                Err(e) => return Err(e),
            }
        };

        Ok(Replay {
            result,
            first_corrupt,
            bad_tail,
        })
    }
}
