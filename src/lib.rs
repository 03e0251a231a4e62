//! # caskkv
//!
//! A single-file, log-structured key-value store with:
//! - Append-only writes, fsync'd before they are acknowledged
//! - An in-memory KeyDir: one seek + one read per lookup
//! - CRC32-verified records and typed values
//! - Crash recovery by replaying the log on open
//! - Lazy expiry and tombstone deletes
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Store                              │
//! │            (Single Writer / Multi Reader)                   │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │   LogFile   │          │   KeyDir    │
//!   │  (Append)   │          │  (RwLock)   │
//!   └──────┬──────┘          └─────────────┘
//!          │                         ▲
//!          ▼                         │ replay on open
//!   ┌─────────────┐          ┌───────┴─────┐
//!   │   Record    │          │ LogRecovery │
//!   │   Codec     │          │ (LogReader) │
//!   └─────────────┘          └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use caskkv::{Store, Value};
//!
//! # fn main() -> caskkv::Result<()> {
//! let store = Store::open_path("books.db")?;
//! store.set(b"othello", "shakespeare")?;
//! assert_eq!(store.get(b"othello")?, Value::from("shakespeare"));
//! store.close()?;
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod format;
pub mod keydir;
pub mod log;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{CaskError, Result};
pub use config::{Config, RecoveryMode};
pub use format::{Record, Value, ValueType};
pub use store::Store;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of caskkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
