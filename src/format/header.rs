//! Record header
//!
//! Fixed-width prefix read in one I/O call before the body size is known.

use bytes::{Buf, BufMut};

use crate::error::{CaskError, Result};

use super::ValueType;

/// Header size: CRC (4) + Timestamp (4) + Expiry (4) + KeyLen (4) + ValLen (4)
/// + Tag (1) + Flags (1) + Reserved (2) = 24 bytes
pub const HEADER_SIZE: usize = 24;

/// Flag bit marking a deleted key
pub const FLAG_TOMBSTONE: u8 = 0b0000_0001;

/// Width of the checksum field, which the checksum itself does not cover
pub(crate) const CHECKSUM_SIZE: usize = 4;

/// Decoded record header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// CRC32 over everything after this field
    pub checksum: u32,

    /// Write time (epoch seconds)
    pub timestamp: u32,

    /// Absolute expiry (epoch seconds), 0 = never
    pub expiry: u32,

    pub key_size: u32,

    pub value_size: u32,

    /// Type of the encoded value
    pub value_type: ValueType,

    /// Bit flags (see FLAG_TOMBSTONE)
    pub flags: u8,
}

impl Header {
    /// Serialize into a fixed-size buffer
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        let mut cursor = &mut buf[..];
        cursor.put_u32_le(self.checksum);
        cursor.put_u32_le(self.timestamp);
        cursor.put_u32_le(self.expiry);
        cursor.put_u32_le(self.key_size);
        cursor.put_u32_le(self.value_size);
        cursor.put_u8(self.value_type as u8);
        cursor.put_u8(self.flags);
        cursor.put_u16_le(0); // reserved
        buf
    }

    /// Parse a header from the first HEADER_SIZE bytes of `data`
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(CaskError::Decoding(format!(
                "Incomplete header: expected {} bytes, got {}",
                HEADER_SIZE,
                data.len()
            )));
        }

        let mut buf = &data[..HEADER_SIZE];
        let checksum = buf.get_u32_le();
        let timestamp = buf.get_u32_le();
        let expiry = buf.get_u32_le();
        let key_size = buf.get_u32_le();
        let value_size = buf.get_u32_le();
        let tag = buf.get_u8();
        let flags = buf.get_u8();

        let value_type = ValueType::from_tag(tag).ok_or_else(|| {
            CaskError::Decoding(format!("Unknown value type tag: 0x{:02x}", tag))
        })?;

        Ok(Self {
            checksum,
            timestamp,
            expiry,
            key_size,
            value_size,
            value_type,
            flags,
        })
    }

    pub fn is_tombstone(&self) -> bool {
        self.flags & FLAG_TOMBSTONE != 0
    }

    /// Whether the record is past its expiry at `now` (epoch seconds)
    pub fn is_expired_at(&self, now: u32) -> bool {
        self.expiry != 0 && now > self.expiry
    }

    /// Total record size on disk: header + key + value
    pub fn record_size(&self) -> u64 {
        HEADER_SIZE as u64 + self.key_size as u64 + self.value_size as u64
    }
}
