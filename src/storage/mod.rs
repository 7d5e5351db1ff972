//! Storage Module
//!
//! Per-segment on-disk structures: a framed record store and a
//! memory-mapped offset index, paired into a segment.
//!
//! ## Responsibilities
//! - Frame and persist records (store)
//! - O(1) relative offset → store position lookup (index)
//! - Translate absolute offsets to relative ones (segment)
//! - Repair an index left pre-allocated by an unclean shutdown (recovery, opt-in)
//!
//! ## File Layout
//! For a segment with base offset `B`, two files live in the log directory:
//! `B.store` and `B.index`. All integers are big-endian.
//!
//! ### Store
//! ```text
//! ┌──────────────┬──────────────────────┬──────────────┬─────────
//! │ Len: u64 (8) │ Payload (Len bytes)  │ Len: u64 (8) │ ...
//! └──────────────┴──────────────────────┴──────────────┴─────────
//! ```
//!
//! ### Index
//! ```text
//! ┌───────────────────────┬────────────────────┐
//! │ Relative Offset: u32  │ Store Position: u64│   entry 0 (12 bytes)
//! ├───────────────────────┼────────────────────┤
//! │ ...                   │ ...                │   entry N
//! ├───────────────────────┴────────────────────┤
//! │ zero pre-allocation up to max_index_bytes  │   (truncated away on close)
//! └────────────────────────────────────────────┘
//! ```

mod index;
mod recovery;
mod segment;
mod store;

use std::path::{Path, PathBuf};

pub use index::Index;
pub use recovery::{scan_index, RecoveryReport};
pub use segment::Segment;
pub use store::Store;

// =============================================================================
// Shared Constants (used by store, index, segment, recovery)
// =============================================================================

/// Width of the length prefix in front of every store record
pub const LEN_WIDTH: u64 = 8;

/// Width of the relative offset in an index entry
pub const OFFSET_WIDTH: u64 = 4;

/// Width of the store position in an index entry
pub const POSITION_WIDTH: u64 = 8;

/// Width of one index entry
pub const ENTRY_WIDTH: u64 = OFFSET_WIDTH + POSITION_WIDTH;

/// Store file extension
pub const STORE_EXTENSION: &str = "store";

/// Index file extension
pub const INDEX_EXTENSION: &str = "index";

// =============================================================================
// Path Helpers
// =============================================================================

/// `<dir>/<base_offset>.store`
pub fn store_path(dir: &Path, base_offset: u64) -> PathBuf {
    dir.join(format!("{}.{}", base_offset, STORE_EXTENSION))
}

/// `<dir>/<base_offset>.index`
pub fn index_path(dir: &Path, base_offset: u64) -> PathBuf {
    dir.join(format!("{}.{}", base_offset, INDEX_EXTENSION))
}

/// Parse a segment base offset from a store or index filename
/// "42.store" → Some(42), "42.index" → Some(42), "notes.txt" → None
pub fn parse_base_offset(path: &Path) -> Option<u64> {
    let ext = path.extension()?.to_str()?;
    if ext != STORE_EXTENSION && ext != INDEX_EXTENSION {
        return None;
    }
    path.file_stem()?.to_str()?.parse().ok()
}
