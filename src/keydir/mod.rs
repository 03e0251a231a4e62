//! KeyDir Module
//!
//! In-memory index from key to the location of its latest record.
//!
//! ## Responsibilities
//! - O(1) point lookups of record locations
//! - Last-write-wins by log order (no timestamp comparison)
//! - Single-writer/multi-reader access pattern
//! - Live key enumeration (tombstones and expired keys masked)
//!
//! ## Data Structure Choice
//! HashMap wrapped in RwLock:
//! - Keys are only ever looked up exactly, so ordering buys nothing
//! - Readers copy an entry out and drop the lock before touching disk
//!
//! The KeyDir never holds values and is never persisted. It is rebuilt from
//! the log on every open.

mod table;

pub use table::KeyDir;

use crate::format::Header;

/// Location and metadata of the latest record for a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEntry {
    /// Timestamp of the record this entry points to
    pub timestamp: u32,

    /// Byte offset of the record start in the log
    pub offset: u64,

    /// Total record length (header + key + value)
    pub size: u64,

    /// Absolute expiry (epoch seconds), 0 = never
    pub expiry: u32,

    /// The record is a tombstone
    pub tombstone: bool,
}

impl KeyEntry {
    pub fn new(timestamp: u32, offset: u64, size: u64) -> Self {
        Self {
            timestamp,
            offset,
            size,
            expiry: 0,
            tombstone: false,
        }
    }

    /// Entry for a record written at `offset` with the given header
    pub fn from_header(header: &Header, offset: u64) -> Self {
        Self {
            timestamp: header.timestamp,
            offset,
            size: header.record_size(),
            expiry: header.expiry,
            tombstone: header.is_tombstone(),
        }
    }

    /// Visible to readers at `now`: not deleted and not expired
    pub fn is_live_at(&self, now: u32) -> bool {
        !self.tombstone && (self.expiry == 0 || now <= self.expiry)
    }
}
