//! # segmentlog
//!
//! The storage core of a commit-log service:
//! - Append-only, offset-addressed records
//! - O(1) reads through memory-mapped per-segment indexes
//! - Size-bounded rotation into immutable segments
//! - Retention by dropping whole segments below a watermark
//! - Raw byte streaming of the whole log for snapshot/restore
//! - Restart from on-disk state without losing closed writes
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                            Log                              │
//! │      (RwLock<Vec<Segment>>, rotation, retention, setup)     │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ append → active segment
//!                       │ read   → owning segment
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                          Segment                            │
//! │        (base_offset, next_offset, absolute ↔ relative)      │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │    Store    │          │    Index    │
//!   │ (BufWriter, │          │   (mmap,    │
//!   │   Mutex)    │          │ 12B entries)│
//!   └─────────────┘          └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use std::io::Read;
//! use std::path::Path;
//! use segmentlog::{Config, Log, Record};
//!
//! let config = Config::builder().max_store_bytes(64 * 1024).build();
//! let log = Log::open(Path::new("./data/log"), config)?;
//!
//! let offset = log.append(&mut Record::new("hello world"))?;
//! assert_eq!(log.read(offset)?.value, b"hello world");
//!
//! let mut snapshot = Vec::new();
//! log.reader().read_to_end(&mut snapshot)?;
//!
//! log.close()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod record;

pub mod storage;
pub mod log;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{LogError, Result};
pub use config::{Config, IndexRecovery, SegmentConfig};
pub use record::{BincodeCodec, Record, RecordCodec};
pub use log::{Log, LogReader};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of segmentlog
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
