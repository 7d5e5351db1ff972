//! Segment
//!
//! Binds one store and one index under a shared base offset, translating
//! the log's absolute offsets into the index's compact relative ones.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::config::{Config, IndexRecovery, SegmentConfig};
use crate::error::{IoContext, LogError, Result};
use crate::record::{Record, RecordCodec};

use super::{index_path, scan_index, store_path, Index, Store};

/// A store + index pair covering offsets `[base_offset, next_offset)`
pub struct Segment {
    /// Framed records; shared with stream readers
    store: Arc<Store>,

    /// Relative offset → store position
    index: Index,

    /// Smallest offset this segment can hold
    base_offset: u64,

    /// Offset assigned to the next appended record
    next_offset: u64,

    /// Size limits for rotation
    config: SegmentConfig,

    /// Record serialization
    codec: Arc<dyn RecordCodec>,
}

impl Segment {
    /// Open or create the segment with the given base offset in `dir`
    ///
    /// On startup:
    /// 1. Open/create `<base>.store`
    /// 2. Optionally repair `<base>.index` (see [`IndexRecovery::Scan`])
    /// 3. Open/create and map `<base>.index`
    /// 4. Recover `next_offset` from the last index entry
    pub fn open(
        dir: &Path,
        base_offset: u64,
        config: &Config,
        codec: Arc<dyn RecordCodec>,
    ) -> Result<Self> {
        let store = Store::open(&store_path(dir, base_offset))?;

        let index_path = index_path(dir, base_offset);
        if config.index_recovery == IndexRecovery::Scan {
            scan_index(&index_path, store.size())?;
        }
        let index = Index::open(&index_path, config.segment.max_index_bytes)?;

        // Empty index: nothing written yet. Otherwise continue after the last entry.
        let next_offset = match index.read_last() {
            Ok((last, _)) => base_offset + u64::from(last) + 1,
            Err(LogError::EndOfData) => base_offset,
            Err(e) => return Err(e),
        };

        debug!(base_offset, next_offset, dir = %dir.display(), "opened segment");

        Ok(Self {
            store: Arc::new(store),
            index,
            base_offset,
            next_offset,
            config: config.segment,
            codec,
        })
    }

    /// Append a record, assigning it the next offset
    ///
    /// Steps:
    /// 1. Check the index has room (nothing is written if it is full)
    /// 2. Set `record.offset`
    /// 3. Encode (nothing is written if this fails)
    /// 4. Append to the store
    /// 5. Write the index entry
    ///
    /// An I/O failure in step 5 leaves the record in the store without an
    /// index entry; it is not rolled back.
    pub fn append(&mut self, record: &mut Record) -> Result<u64> {
        let offset = self.next_offset;
        let relative = u32::try_from(offset - self.base_offset).map_err(|_| LogError::EndOfData)?;
        if self.index.is_full() {
            return Err(LogError::EndOfData);
        }

        record.offset = offset;
        let bytes = self.codec.encode(record)?;

        let (_, position) = self.store.append(&bytes)?;
        self.index.write(relative, position)?;

        self.next_offset += 1;
        Ok(offset)
    }

    /// Read the record at absolute `offset`
    pub fn read(&self, offset: u64) -> Result<Record> {
        if offset < self.base_offset {
            return Err(LogError::OffsetOutOfRange { offset });
        }

        let (_, position) = self.index.read(offset - self.base_offset)?;
        let bytes = self.store.read(position)?;
        self.codec.decode(&bytes)
    }

    /// Whether either the store or the index has reached its limit
    ///
    /// Both are checked: small records exhaust the index first, large ones
    /// the store.
    pub fn is_maxed(&self) -> bool {
        self.store.size() >= self.config.max_store_bytes
            || self.index.size() >= self.config.index_capacity()
    }

    /// Close the index and the store
    pub fn close(&mut self) -> Result<()> {
        self.index.close()?;
        self.store.close()?;
        Ok(())
    }

    /// Close the segment and delete both of its files
    pub fn remove(&mut self) -> Result<()> {
        self.close()?;

        fs::remove_file(self.index.path()).context("remove index", self.index.path())?;
        fs::remove_file(self.store.path()).context("remove store", self.store.path())?;

        debug!(base_offset = self.base_offset, "removed segment");
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Smallest offset this segment can hold
    pub fn base_offset(&self) -> u64 {
        self.base_offset
    }

    /// Offset the next append will receive
    pub fn next_offset(&self) -> u64 {
        self.next_offset
    }

    /// Whether `offset` has been written to this segment
    pub fn contains(&self, offset: u64) -> bool {
        self.base_offset <= offset && offset < self.next_offset
    }

    /// Store size in bytes
    pub fn store_size(&self) -> u64 {
        self.store.size()
    }

    /// Index size in bytes
    pub fn index_size(&self) -> u64 {
        self.index.size()
    }

    /// Shared handle to the store, for raw streaming
    pub fn store(&self) -> Arc<Store> {
        Arc::clone(&self.store)
    }
}
