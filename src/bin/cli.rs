//! caskkv CLI
//!
//! Command-line interface operating directly on a caskkv data file.

use std::path::Path;
use std::process;
use std::time::Duration;

use caskkv::log::LogRecovery;
use caskkv::{CaskError, Config, RecoveryMode, Store};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

/// caskkv CLI
#[derive(Parser, Debug)]
#[command(name = "caskkv-cli")]
#[command(about = "CLI for the caskkv key-value store")]
#[command(version)]
struct Args {
    /// Data file
    #[arg(short, long, default_value = "./caskkv.db")]
    file: String,

    /// Take an exclusive lock on the data file
    #[arg(long)]
    lock: bool,

    /// Refuse to open a log with a truncated tail or a corrupt record
    #[arg(long)]
    strict: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,

        /// Expire the key after this many seconds
        #[arg(long)]
        ttl: Option<u64>,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// List live keys
    Keys,

    /// Print every record in the log, oldest first
    Scan,

    /// Check the log without opening it for writes
    Verify,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,caskkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        match e {
            CaskError::KeyNotFound => {
                eprintln!("(not found)");
                process::exit(2);
            }
            e => {
                tracing::error!("{}", e);
                process::exit(1);
            }
        }
    }
}

fn run(args: Args) -> caskkv::Result<()> {
    if let Commands::Verify = args.command {
        let result = LogRecovery::verify(Path::new(&args.file))?;
        println!(
            "records={} tombstones={} corrupt={} valid_length={} discarded_bytes={}",
            result.records_replayed,
            result.tombstones,
            result.corrupt_records,
            result.valid_length,
            result.discarded_bytes
        );
        return Ok(());
    }

    let recovery_mode = if args.strict {
        RecoveryMode::Strict
    } else {
        RecoveryMode::TruncateTail
    };

    let config = Config::builder()
        .path(&args.file)
        .lock_file(args.lock)
        .recovery_mode(recovery_mode)
        .build();

    let store = Store::open(config)?;

    let result = match args.command {
        Commands::Get { key } => store.get(key.as_bytes()).map(|value| println!("{}", value)),
        Commands::Set { key, value, ttl } => match ttl {
            Some(secs) => store.set_with_expiry(key.as_bytes(), value, Duration::from_secs(secs)),
            None => store.set(key.as_bytes(), value),
        },
        Commands::Del { key } => store.delete(key.as_bytes()),
        Commands::Keys => {
            for key in store.list_keys() {
                println!("{}", String::from_utf8_lossy(&key));
            }
            Ok(())
        }
        Commands::Scan => scan(&store),
        Commands::Verify => Ok(()),
    };

    store.close()?;
    result
}

fn scan(store: &Store) -> caskkv::Result<()> {
    for entry in store.scan()? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(CaskError::CorruptRecord { offset, reason }) => {
                println!("{:>10}  <corrupt: {}>", offset, reason);
                continue;
            }
            Err(e) => return Err(e),
        };
        let record = &entry.record;
        let key = String::from_utf8_lossy(&record.key);

        if record.is_tombstone() {
            println!("{:>10}  {}  <deleted>", entry.offset, key);
        } else {
            println!(
                "{:>10}  {}  {:?}  {}",
                entry.offset,
                key,
                record.header.value_type,
                record.value()?
            );
        }
    }
    Ok(())
}
