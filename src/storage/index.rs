//! Index
//!
//! Fixed-width, memory-mapped array of `(relative offset, store position)`
//! entries. The file is grown to its full capacity before mapping, because a
//! mapped region cannot be grown in place, and shrunk back to the written
//! entries on close so a restart can count entries from the file length.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use bytes::{Buf, BufMut};
use memmap2::MmapMut;
use tracing::{debug, warn};

use crate::error::{IoContext, LogError, Result};

use super::ENTRY_WIDTH;

/// Memory-mapped offset index for one segment
///
/// The mapping itself is never handed out; every access goes through
/// [`Index::read`] / [`Index::write`], which bounds-check against the
/// written size and the mapped capacity.
pub struct Index {
    /// Backing file path
    path: PathBuf,

    /// File + mapping; `None` once closed
    mapped: Option<Mapped>,

    /// Bytes of valid entries (always a multiple of ENTRY_WIDTH)
    size: u64,

    /// Length of the mapped region in bytes
    capacity: u64,
}

struct Mapped {
    file: File,
    mmap: MmapMut,
}

impl Index {
    /// Open or create an index file, pre-allocated to `max_index_bytes`
    /// (rounded down to whole entries)
    ///
    /// The written size is taken from the file length on disk before the
    /// pre-allocation. A length that is not a whole number of entries is
    /// reported as [`LogError::CorruptIndex`].
    pub fn open(path: &Path, max_index_bytes: u64) -> Result<Self> {
        let capacity = max_index_bytes - max_index_bytes % ENTRY_WIDTH;
        if capacity == 0 {
            return Err(LogError::Config(format!(
                "index capacity {} cannot hold a {}-byte entry",
                max_index_bytes, ENTRY_WIDTH
            )));
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .context("open index", path)?;

        let size = file.metadata().context("stat index", path)?.len();
        if size % ENTRY_WIDTH != 0 {
            return Err(LogError::CorruptIndex {
                path: path.to_path_buf(),
                len: size,
            });
        }

        // Never pre-allocate below what is already written
        let capacity = capacity.max(size);
        file.set_len(capacity).context("pre-allocate index", path)?;

        // SAFETY: the file is opened read/write, sized before mapping and owned
        // by this index for the lifetime of the map. The region is only
        // accessed through bounds-checked accessors below.
        let mmap = unsafe { MmapMut::map_mut(&file) }.context("map index", path)?;

        debug!(
            path = %path.display(),
            entries = size / ENTRY_WIDTH,
            capacity,
            "opened index"
        );

        Ok(Self {
            path: path.to_path_buf(),
            mapped: Some(Mapped { file, mmap }),
            size,
            capacity,
        })
    }

    /// Read entry number `entry` (zero-based)
    ///
    /// Returns `(relative_offset, store_position)`, or
    /// [`LogError::EndOfData`] if the entry has not been written.
    pub fn read(&self, entry: u64) -> Result<(u32, u64)> {
        let mapped = self.mapped.as_ref().ok_or(LogError::Closed)?;

        let start = entry
            .checked_mul(ENTRY_WIDTH)
            .filter(|start| start.checked_add(ENTRY_WIDTH).is_some_and(|end| end <= self.size))
            .ok_or(LogError::EndOfData)? as usize;

        let mut slot = &mapped.mmap[start..start + ENTRY_WIDTH as usize];
        let offset = slot.get_u32();
        let position = slot.get_u64();

        Ok((offset, position))
    }

    /// Read the most recently written entry
    pub fn read_last(&self) -> Result<(u32, u64)> {
        if self.size == 0 {
            return Err(LogError::EndOfData);
        }
        self.read(self.size / ENTRY_WIDTH - 1)
    }

    /// Append an entry
    ///
    /// Fails with [`LogError::EndOfData`] when the mapped region has no room
    /// for another entry.
    pub fn write(&mut self, offset: u32, position: u64) -> Result<()> {
        let mapped = self.mapped.as_mut().ok_or(LogError::Closed)?;

        if self.size + ENTRY_WIDTH > self.capacity {
            return Err(LogError::EndOfData);
        }

        let start = self.size as usize;
        let mut slot = &mut mapped.mmap[start..start + ENTRY_WIDTH as usize];
        slot.put_u32(offset);
        slot.put_u64(position);

        self.size += ENTRY_WIDTH;
        Ok(())
    }

    /// Sync the mapping and the file, then truncate the file to the written
    /// entries and close it
    ///
    /// Closing an already closed index is a no-op.
    pub fn close(&mut self) -> Result<()> {
        let Some(Mapped { file, mmap }) = self.mapped.take() else {
            return Ok(());
        };

        mmap.flush().context("sync index map", &self.path)?;
        drop(mmap);

        file.sync_all().context("sync index", &self.path)?;
        file.set_len(self.size).context("truncate index", &self.path)?;
        file.sync_all().context("sync truncated index", &self.path)?;

        debug!(
            path = %self.path.display(),
            entries = self.size / ENTRY_WIDTH,
            "closed index"
        );
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Bytes of written entries
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Number of written entries
    pub fn entries(&self) -> u64 {
        self.size / ENTRY_WIDTH
    }

    /// Mapped capacity in bytes
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// No room for another entry
    pub fn is_full(&self) -> bool {
        self.size + ENTRY_WIDTH > self.capacity
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether [`Index::close`] has run
    pub fn is_closed(&self) -> bool {
        self.mapped.is_none()
    }
}

impl Drop for Index {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(path = %self.path.display(), error = %e, "failed to close index on drop");
        }
    }
}
