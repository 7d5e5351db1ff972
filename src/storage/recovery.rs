//! Index Recovery
//!
//! Repairs an index file that was never truncated back to its written size,
//! which is what an unclean shutdown leaves behind: valid entries followed by
//! zero-filled pre-allocation.
//!
//! This pass is opt-in ([`crate::config::IndexRecovery::Scan`]). Without it a
//! zero-padded index is taken at face value.

use std::fs::OpenOptions;
use std::io::Read;
use std::path::Path;

use bytes::Buf;
use tracing::warn;

use crate::error::{IoContext, Result};

use super::ENTRY_WIDTH;

/// Result of an index scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecoveryReport {
    /// Entries kept
    pub entries_valid: u64,

    /// Bytes truncated from the end of the file
    pub bytes_discarded: u64,
}

impl RecoveryReport {
    /// Whether the scan changed the file
    pub fn was_truncated(&self) -> bool {
        self.bytes_discarded > 0
    }
}

/// Scan an index file and truncate it after the last plausible entry
///
/// Entry `i` is kept only if its relative offset is exactly `i`, its store
/// position is below `store_size`, and positions are strictly increasing.
/// Entries are written densely from relative offset 0, so the first entry
/// failing any of these checks marks the end. A missing file is left alone.
///
/// A store holding records past the last indexed one is not repaired here.
pub fn scan_index(path: &Path, store_size: u64) -> Result<RecoveryReport> {
    if !path.exists() {
        return Ok(RecoveryReport::default());
    }

    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .context("open index for recovery", path)?;

    let mut data = Vec::new();
    file.read_to_end(&mut data).context("read index for recovery", path)?;
    let file_len = data.len() as u64;

    let mut entries_valid: u64 = 0;
    let mut last_position: Option<u64> = None;

    for mut entry in data.chunks_exact(ENTRY_WIDTH as usize) {
        let offset = entry.get_u32();
        let position = entry.get_u64();

        let in_sequence = u64::from(offset) == entries_valid;
        let in_store = position < store_size;
        let ascending = last_position.map_or(true, |last| position > last);

        if !(in_sequence && in_store && ascending) {
            break;
        }

        last_position = Some(position);
        entries_valid += 1;
    }

    let valid_len = entries_valid * ENTRY_WIDTH;
    let report = RecoveryReport {
        entries_valid,
        bytes_discarded: file_len - valid_len,
    };

    if report.was_truncated() {
        file.set_len(valid_len).context("truncate index", path)?;
        file.sync_all().context("sync index", path)?;

        warn!(
            path = %path.display(),
            entries_valid,
            bytes_discarded = report.bytes_discarded,
            "repaired index left unclosed"
        );
    }

    Ok(report)
}
