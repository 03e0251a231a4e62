//! Typed values
//!
//! A closed set of primitive kinds plus a raw-bytes escape hatch. The tag is
//! stored in the record header so `decode` can rebuild the original type.

use std::fmt;

use crate::error::{CaskError, Result};

/// Value type tags as persisted on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ValueType {
    Bytes = 0x00,
    Str = 0x01,
    Char = 0x02,
    Bool = 0x03,
    I8 = 0x10,
    I16 = 0x11,
    I32 = 0x12,
    I64 = 0x13,
    U8 = 0x20,
    U16 = 0x21,
    U32 = 0x22,
    U64 = 0x23,
    F32 = 0x30,
    F64 = 0x31,
}

impl ValueType {
    /// Map an on-disk tag back to a type, None for unknown tags
    pub fn from_tag(tag: u8) -> Option<Self> {
        let value_type = match tag {
            0x00 => ValueType::Bytes,
            0x01 => ValueType::Str,
            0x02 => ValueType::Char,
            0x03 => ValueType::Bool,
            0x10 => ValueType::I8,
            0x11 => ValueType::I16,
            0x12 => ValueType::I32,
            0x13 => ValueType::I64,
            0x20 => ValueType::U8,
            0x21 => ValueType::U16,
            0x22 => ValueType::U32,
            0x23 => ValueType::U64,
            0x30 => ValueType::F32,
            0x31 => ValueType::F64,
            _ => return None,
        };
        Some(value_type)
    }
}

/// A value stored under a key
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bytes(Vec<u8>),
    Str(String),
    Char(char),
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Bytes(_) => ValueType::Bytes,
            Value::Str(_) => ValueType::Str,
            Value::Char(_) => ValueType::Char,
            Value::Bool(_) => ValueType::Bool,
            Value::I8(_) => ValueType::I8,
            Value::I16(_) => ValueType::I16,
            Value::I32(_) => ValueType::I32,
            Value::I64(_) => ValueType::I64,
            Value::U8(_) => ValueType::U8,
            Value::U16(_) => ValueType::U16,
            Value::U32(_) => ValueType::U32,
            Value::U64(_) => ValueType::U64,
            Value::F32(_) => ValueType::F32,
            Value::F64(_) => ValueType::F64,
        }
    }

    /// Length of the encoded payload in bytes
    pub fn encoded_len(&self) -> usize {
        match self {
            Value::Bytes(b) => b.len(),
            Value::Str(s) => s.len(),
            Value::Char(c) => c.len_utf8(),
            Value::Bool(_) | Value::I8(_) | Value::U8(_) => 1,
            Value::I16(_) | Value::U16(_) => 2,
            Value::I32(_) | Value::U32(_) | Value::F32(_) => 4,
            Value::I64(_) | Value::U64(_) | Value::F64(_) => 8,
        }
    }

    /// Encode the payload; numbers are fixed-width little-endian
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Value::Bytes(b) => b.clone(),
            Value::Str(s) => s.as_bytes().to_vec(),
            Value::Char(c) => {
                let mut buf = [0u8; 4];
                c.encode_utf8(&mut buf).as_bytes().to_vec()
            }
            Value::Bool(b) => vec![u8::from(*b)],
            Value::I8(v) => v.to_le_bytes().to_vec(),
            Value::I16(v) => v.to_le_bytes().to_vec(),
            Value::I32(v) => v.to_le_bytes().to_vec(),
            Value::I64(v) => v.to_le_bytes().to_vec(),
            Value::U8(v) => vec![*v],
            Value::U16(v) => v.to_le_bytes().to_vec(),
            Value::U32(v) => v.to_le_bytes().to_vec(),
            Value::U64(v) => v.to_le_bytes().to_vec(),
            Value::F32(v) => v.to_le_bytes().to_vec(),
            Value::F64(v) => v.to_le_bytes().to_vec(),
        }
    }

    /// Rebuild a value from its tag and payload
    pub fn decode(value_type: ValueType, data: &[u8]) -> Result<Self> {
        let value = match value_type {
            ValueType::Bytes => Value::Bytes(data.to_vec()),
            ValueType::Str => Value::Str(
                String::from_utf8(data.to_vec())
                    .map_err(|e| CaskError::InvalidValue(format!("string is not UTF-8: {}", e)))?,
            ),
            ValueType::Char => {
                let s = std::str::from_utf8(data)
                    .map_err(|e| CaskError::InvalidValue(format!("char is not UTF-8: {}", e)))?;
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Value::Char(c),
                    _ => {
                        return Err(CaskError::InvalidValue(format!(
                            "expected exactly one char, got {:?}",
                            s
                        )))
                    }
                }
            }
            ValueType::Bool => match fixed::<1>(value_type, data)? {
                [0] => Value::Bool(false),
                [1] => Value::Bool(true),
                [b] => {
                    return Err(CaskError::InvalidValue(format!(
                        "bool byte must be 0 or 1, got {}",
                        b
                    )))
                }
            },
            ValueType::I8 => Value::I8(i8::from_le_bytes(fixed(value_type, data)?)),
            ValueType::I16 => Value::I16(i16::from_le_bytes(fixed(value_type, data)?)),
            ValueType::I32 => Value::I32(i32::from_le_bytes(fixed(value_type, data)?)),
            ValueType::I64 => Value::I64(i64::from_le_bytes(fixed(value_type, data)?)),
            ValueType::U8 => Value::U8(u8::from_le_bytes(fixed(value_type, data)?)),
            ValueType::U16 => Value::U16(u16::from_le_bytes(fixed(value_type, data)?)),
            ValueType::U32 => Value::U32(u32::from_le_bytes(fixed(value_type, data)?)),
            ValueType::U64 => Value::U64(u64::from_le_bytes(fixed(value_type, data)?)),
            ValueType::F32 => Value::F32(f32::from_le_bytes(fixed(value_type, data)?)),
            ValueType::F64 => Value::F64(f64::from_le_bytes(fixed(value_type, data)?)),
        };
        Ok(value)
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// Copy a payload into a fixed-width array, rejecting any other length
fn fixed<const N: usize>(value_type: ValueType, data: &[u8]) -> Result<[u8; N]> {
    data.try_into().map_err(|_| {
        CaskError::InvalidValue(format!(
            "{:?} payload must be {} bytes, got {}",
            value_type,
            N,
            data.len()
        ))
    })
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bytes(b) => write!(f, "{}", String::from_utf8_lossy(b)),
            Value::Str(s) => write!(f, "{}", s),
            Value::Char(c) => write!(f, "{}", c),
            Value::Bool(b) => write!(f, "{}", b),
            Value::I8(v) => write!(f, "{}", v),
            Value::I16(v) => write!(f, "{}", v),
            Value::I32(v) => write!(f, "{}", v),
            Value::I64(v) => write!(f, "{}", v),
            Value::U8(v) => write!(f, "{}", v),
            Value::U16(v) => write!(f, "{}", v),
            Value::U32(v) => write!(f, "{}", v),
            Value::U64(v) => write!(f, "{}", v),
            Value::F32(v) => write!(f, "{}", v),
            Value::F64(v) => write!(f, "{}", v),
        }
    }
}

// =============================================================================
// Conversions
// =============================================================================

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    Vec<u8> => Bytes,
    String => Str,
    char => Char,
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Bytes(b.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for Value {
    fn from(b: &[u8; N]) -> Self {
        Value::Bytes(b.to_vec())
    }
}
