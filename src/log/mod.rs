//! Log Module
//!
//! The single append-only data file and everything that touches it.
//!
//! ## Responsibilities
//! - Durable appends (write + fsync before returning)
//! - Positioned reads for point lookups
//! - Sequential scans of the log, record by record
//! - Replay on startup to rebuild the KeyDir
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ Record 1                                │
//! │ ┌────────────┬─────────┬──────────────┐ │
//! │ │ Header(24) │   Key   │    Value     │ │
//! │ └────────────┴─────────┴──────────────┘ │
//! ├─────────────────────────────────────────┤
//! │ Record 2                                │
//! │ ┌────────────┬─────────┬──────────────┐ │
//! │ │ Header(24) │   Key   │    Value     │ │
//! │ └────────────┴─────────┴──────────────┘ │
//! └─────────────────────────────────────────┘
//! ```
//!
//! Records are never rewritten. A record's offset is its identity for the
//! lifetime of the file.

mod file;
mod reader;
mod recovery;

pub use file::LogFile;
pub use reader::{LogEntry, LogReader};
pub use recovery::{LogRecovery, RecoveryResult};
