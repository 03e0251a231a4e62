//! Error types for caskkv
//!
//! Provides a unified error type for all operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using CaskError
pub type Result<T> = std::result::Result<T, CaskError>;

/// Unified error type for caskkv operations
#[derive(Debug, Error)]
pub enum CaskError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Seek to offset {offset} failed: {source}")]
    Seek {
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("Read of {len} bytes at offset {offset} failed: {source}")]
    Read {
        offset: u64,
        len: u64,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Input Validation Errors
    // -------------------------------------------------------------------------
    #[error("Invalid key: empty key not allowed")]
    EmptyKey,

    #[error("Invalid key: {size} bytes exceeds limit of {max}")]
    KeyTooLarge { size: usize, max: u32 },

    #[error("Invalid value: {size} bytes exceeds limit of {max}")]
    ValueTooLarge { size: usize, max: u32 },

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    // -------------------------------------------------------------------------
    // Record Codec Errors
    // -------------------------------------------------------------------------
    #[error("Encoding failed: {0}")]
    Encoding(String),

    #[error("Decoding failed: {0}")]
    Decoding(String),

    #[error("Checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { stored: u32, computed: u32 },

    #[error("Key not found")]
    KeyNotFound,

    // -------------------------------------------------------------------------
    // Log Errors
    // -------------------------------------------------------------------------
    #[error("Truncated record at offset {offset}")]
    TruncatedRecord { offset: u64 },

    #[error("Log corruption detected at offset {offset}: {reason}")]
    CorruptLog { offset: u64, reason: String },

    #[error("Record at offset {offset} failed verification: {reason}")]
    CorruptRecord { offset: u64, reason: String },

    #[error("Append at offset {offset} failed: {source}")]
    AppendFailed {
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("Log writer poisoned by an earlier failed append; reopen the store")]
    LogPoisoned,

    #[error("Store is closed")]
    Closed,

    #[error("Data file {0} is locked by another writer")]
    Locked(PathBuf),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
