//! Record Format Module
//!
//! Serialization of a single key-value record. No I/O happens here.
//!
//! ## Responsibilities
//! - Fixed-size header encode/decode
//! - Record encode/decode (header + key + value)
//! - CRC32 checksums for corruption detection
//! - Typed values with the type tag persisted in the header
//!
//! ## Record Format
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │ Header (24 bytes, little-endian)                                 │
//! │ ┌─────────┬─────────┬─────────┬─────────┬─────────┬────┬────┬──┐ │
//! │ │ CRC (4) │ TS (4)  │ Exp (4) │KeyLen(4)│ValLen(4)│Tag │Flag│00│ │
//! │ └─────────┴─────────┴─────────┴─────────┴─────────┴────┴────┴──┘ │
//! ├──────────────────────────────────────────────────────────────────┤
//! │ Key (KeyLen bytes)                                               │
//! ├──────────────────────────────────────────────────────────────────┤
//! │ Value (ValLen bytes)                                             │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The CRC covers header bytes 4..24, the key and the value. `Exp` is an
//! absolute epoch second (0 = never). Bit 0 of `Flag` marks a tombstone.

mod header;
mod record;
mod value;

pub use header::{Header, FLAG_TOMBSTONE, HEADER_SIZE};
pub use record::{checksum, Record};
pub use value::{Value, ValueType};

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall clock in epoch seconds, saturated into the on-disk u32 field
pub fn now_secs() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u32::try_from(d.as_secs()).unwrap_or(u32::MAX))
        .unwrap_or(0)
}
