//! Record encoding and decoding
//!
//! A record is the unit of durability: header ++ key ++ value.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{CaskError, Result};

use super::header::CHECKSUM_SIZE;
use super::{Header, Value, ValueType, FLAG_TOMBSTONE, HEADER_SIZE};

/// CRC32 (IEEE) over a byte slice
pub fn checksum(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

/// A single key-value record as stored in the log
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub header: Header,
    pub key: Vec<u8>,
    /// Encoded value payload (see `Value::encode`)
    pub value: Vec<u8>,
}

impl Record {
    /// Build a live record and seal it with its checksum
    ///
    /// Fails with `Encoding` if key or value length does not fit in u32.
    pub fn new(key: &[u8], value: &Value, timestamp: u32, expiry: u32) -> Result<Self> {
        Self::build(key, value.encode(), value.value_type(), timestamp, expiry, 0)
    }

    /// Build a tombstone for `key` (zero-length value, tombstone flag set)
    pub fn tombstone(key: &[u8], timestamp: u32) -> Result<Self> {
        Self::build(key, Vec::new(), ValueType::Bytes, timestamp, 0, FLAG_TOMBSTONE)
    }

    fn build(
        key: &[u8],
        value: Vec<u8>,
        value_type: ValueType,
        timestamp: u32,
        expiry: u32,
        flags: u8,
    ) -> Result<Self> {
        let key_size = u32::try_from(key.len()).map_err(|_| {
            CaskError::Encoding(format!("key of {} bytes exceeds u32 length field", key.len()))
        })?;
        let value_size = u32::try_from(value.len()).map_err(|_| {
            CaskError::Encoding(format!(
                "value of {} bytes exceeds u32 length field",
                value.len()
            ))
        })?;

        let mut record = Self {
            header: Header {
                checksum: 0,
                timestamp,
                expiry,
                key_size,
                value_size,
                value_type,
                flags,
            },
            key: key.to_vec(),
            value,
        };
        record.header.checksum = record.compute_checksum();
        Ok(record)
    }

    /// Serialize to header ++ key ++ value
    pub fn encode(&self) -> Result<Bytes> {
        if self.header.key_size as usize != self.key.len()
            || self.header.value_size as usize != self.value.len()
        {
            return Err(CaskError::Encoding(format!(
                "header sizes ({}, {}) disagree with body ({}, {})",
                self.header.key_size,
                self.header.value_size,
                self.key.len(),
                self.value.len()
            )));
        }

        let mut buf = BytesMut::with_capacity(self.size() as usize);
        buf.put_slice(&self.header.encode());
        buf.put_slice(&self.key);
        buf.put_slice(&self.value);
        Ok(buf.freeze())
    }

    /// Parse a record; trailing bytes beyond the declared sizes are ignored
    pub fn decode(data: &[u8]) -> Result<Self> {
        let header = Header::decode(data)?;

        let total = header.record_size();
        if (data.len() as u64) < total {
            return Err(CaskError::Decoding(format!(
                "Incomplete record: expected {} bytes, got {}",
                total,
                data.len()
            )));
        }

        let key_end = HEADER_SIZE + header.key_size as usize;
        let value_end = key_end + header.value_size as usize;

        Ok(Self {
            header,
            key: data[HEADER_SIZE..key_end].to_vec(),
            value: data[key_end..value_end].to_vec(),
        })
    }

    /// CRC over the header fields after the checksum, the key and the value
    pub fn compute_checksum(&self) -> u32 {
        let header = self.header.encode();
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&header[CHECKSUM_SIZE..]);
        hasher.update(&self.key);
        hasher.update(&self.value);
        hasher.finalize()
    }

    /// Whether the stored checksum matches the record contents
    pub fn verify(&self) -> bool {
        self.header.checksum == self.compute_checksum()
    }

    /// Like `verify`, but reports both checksums on mismatch
    pub fn check(&self) -> Result<()> {
        let computed = self.compute_checksum();
        if computed != self.header.checksum {
            return Err(CaskError::ChecksumMismatch {
                stored: self.header.checksum,
                computed,
            });
        }
        Ok(())
    }

    /// Decode the typed value
    pub fn value(&self) -> Result<Value> {
        Value::decode(self.header.value_type, &self.value)
    }

    pub fn is_tombstone(&self) -> bool {
        self.header.is_tombstone()
    }

    /// Encoded size in bytes
    pub fn size(&self) -> u64 {
        self.header.record_size()
    }
}
