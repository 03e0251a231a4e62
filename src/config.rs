//! Configuration for caskkv
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{CaskError, Result};

/// Main configuration for a caskkv store
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Path of the single append-only data file
    pub path: PathBuf,

    /// What replay does when the log ends in a record it cannot use
    pub recovery_mode: RecoveryMode,

    /// Take an exclusive advisory lock on the data file while open
    pub lock_file: bool,

    // -------------------------------------------------------------------------
    // Limits
    // -------------------------------------------------------------------------
    /// Max key length in bytes
    pub max_key_size: u32,

    /// Max encoded value length in bytes
    pub max_value_size: u32,
}

/// Replay policy for a truncated or corrupt tail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryMode {
    /// Cut off a torn or unreadable tail; records failing their checksum stay
    /// indexed and report `ChecksumMismatch` on read
    TruncateTail,

    /// Refuse to open a log with a bad tail or any record failing its checksum
    Strict,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./caskkv.db"),
            recovery_mode: RecoveryMode::TruncateTail,
            lock_file: false,
            max_key_size: u32::MAX,
            max_value_size: u32::MAX,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the config for values the store cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(CaskError::Config("data file path is empty".to_string()));
        }
        if self.max_key_size == 0 {
            return Err(CaskError::Config(
                "max_key_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data file path
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Set the tail recovery policy
    pub fn recovery_mode(mut self, mode: RecoveryMode) -> Self {
        self.config.recovery_mode = mode;
        self
    }

    /// Enable or disable the exclusive file lock
    pub fn lock_file(mut self, lock: bool) -> Self {
        self.config.lock_file = lock;
        self
    }

    /// Set the maximum key size (in bytes)
    pub fn max_key_size(mut self, size: u32) -> Self {
        self.config.max_key_size = size;
        self
    }

    /// Set the maximum value size (in bytes)
    pub fn max_value_size(mut self, size: u32) -> Self {
        self.config.max_value_size = size;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
