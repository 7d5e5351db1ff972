//! Log Manager
//!
//! Presents one logical, offset-addressed log over an ordered set of segments.
//!
//! ## Responsibilities
//! - Discover existing segments on startup (or bootstrap the first one)
//! - Route appends to the active (newest) segment and rotate when it is maxed
//! - Route reads to the segment owning the offset
//! - Drop whole segments below a retention watermark
//! - Stream the raw store bytes of every segment for snapshots

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{IoContext, LogError, Result};
use crate::record::{BincodeCodec, Record, RecordCodec};
use crate::storage::{parse_base_offset, Segment};

use super::reader::{LogReader, SegmentReader};

/// An append-only, segmented commit log
///
/// ## Concurrency:
/// - `segments`: one log-wide RwLock. Appends (and rotation), truncation,
///   close/remove/reset take it exclusively; reads, offset queries and
///   `reader()` share it. Appends are fully serialized: there is no
///   per-segment write parallelism.
/// - Each store has its own mutex, so a [`LogReader`] can stream a segment
///   while an append to that segment is in flight.
/// - All methods use `&self`
pub struct Log {
    /// Directory holding `<base>.store` / `<base>.index` pairs
    dir: PathBuf,

    /// Configuration with defaults applied
    config: Config,

    /// Record serialization shared by every segment
    codec: Arc<dyn RecordCodec>,

    /// Segments ordered by base offset; the last one is active
    segments: RwLock<Vec<Segment>>,
}

impl Log {
    /// Open or create a log in `dir` using the bincode record codec
    pub fn open(dir: &Path, config: Config) -> Result<Self> {
        Self::open_with_codec(dir, config, Arc::new(BincodeCodec))
    }

    /// Open or create a log in `dir` with a custom record codec
    ///
    /// Zero size limits are replaced by the 1024-byte defaults before the
    /// directory is scanned.
    pub fn open_with_codec(dir: &Path, config: Config, codec: Arc<dyn RecordCodec>) -> Result<Self> {
        let config = config.with_defaults()?;

        let log = Self {
            dir: dir.to_path_buf(),
            config,
            codec,
            segments: RwLock::new(Vec::new()),
        };

        let segments = log.setup()?;
        *log.segments.write() = segments;

        Ok(log)
    }

    /// Append a record, assigning and returning its offset
    ///
    /// Rotates to a new active segment (based at `offset + 1`) as soon as
    /// the current one is maxed.
    pub fn append(&self, record: &mut Record) -> Result<u64> {
        let mut segments = self.segments.write();
        let active = segments.last().ok_or(LogError::Closed)?;

        // Reopened with tighter limits than the active segment was written under
        if active.is_maxed() {
            let next_base = active.next_offset();
            segments.push(self.new_segment(next_base)?);
            debug!(base_offset = next_base, "rotated maxed segment before append");
        }

        let active = segments.last_mut().ok_or(LogError::Closed)?;
        let offset = active.append(record)?;

        if active.is_maxed() {
            let next_base = offset + 1;
            segments.push(self.new_segment(next_base)?);
            debug!(base_offset = next_base, "rotated active segment");
        }

        Ok(offset)
    }

    /// Read the record at `offset`
    ///
    /// Returns [`LogError::OffsetOutOfRange`] if no segment has written it.
    pub fn read(&self, offset: u64) -> Result<Record> {
        let segments = self.segments.read();

        // Segments are few (bounded by retention), so a linear scan is fine
        let segment = segments
            .iter()
            .find(|segment| segment.contains(offset))
            .ok_or(LogError::OffsetOutOfRange { offset })?;

        segment.read(offset)
    }

    /// Base offset of the oldest segment
    pub fn lowest_offset(&self) -> Result<u64> {
        let segments = self.segments.read();
        segments
            .first()
            .map(Segment::base_offset)
            .ok_or(LogError::Closed)
    }

    /// Offset of the newest record, or 0 if nothing has been written
    pub fn highest_offset(&self) -> Result<u64> {
        let segments = self.segments.read();
        let next = segments
            .last()
            .map(Segment::next_offset)
            .ok_or(LogError::Closed)?;

        Ok(next.saturating_sub(1))
    }

    /// Remove every segment whose highest offset is `<= lowest`
    ///
    /// An active segment whose records are all at or below `lowest` is
    /// replaced by an empty one starting at its next offset, so the log stays
    /// appendable and offsets keep counting up. A failed removal stops the
    /// pass; the failing segment and everything after it stay in the log.
    pub fn truncate(&self, lowest: u64) -> Result<()> {
        let mut segments = self.segments.write();
        let Some(mut active) = segments.pop() else {
            return Ok(());
        };

        let expired = |segment: &Segment| segment.next_offset() <= lowest.saturating_add(1);

        let mut kept = Vec::with_capacity(segments.len() + 1);
        let mut removed = 0usize;
        let mut result = Ok(());

        for mut segment in std::mem::take(&mut *segments) {
            if result.is_ok() && expired(&segment) {
                match segment.remove() {
                    Ok(()) => {
                        removed += 1;
                        continue;
                    }
                    Err(e) => result = Err(e),
                }
            }
            kept.push(segment);
        }

        // An empty active segment has nothing to drop
        let holds_records = active.next_offset() > active.base_offset();
        if result.is_ok() && holds_records && expired(&active) {
            let next_base = active.next_offset();
            match self.new_segment(next_base) {
                Ok(fresh) => {
                    match active.remove() {
                        Ok(()) => removed += 1,
                        Err(e) => {
                            result = Err(e);
                            kept.push(active);
                        }
                    }
                    debug!(base_offset = next_base, "replaced truncated active segment");
                    active = fresh;
                }
                Err(e) => result = Err(e),
            }
        }
        kept.push(active);

        *segments = kept;

        if removed > 0 {
            info!(lowest, removed, remaining = segments.len(), "truncated log");
        }
        result
    }

    /// Stream the raw bytes of every store, oldest segment first
    ///
    /// The stream is the on-disk framing (length prefixes included), not
    /// decoded records. It reflects the segments present when called and
    /// must not be used after those segments are removed.
    pub fn reader(&self) -> LogReader {
        let segments = self.segments.read();
        let readers = segments
            .iter()
            .map(|segment| SegmentReader::new(segment.store()))
            .collect();

        LogReader::new(readers)
    }

    /// Close every segment
    ///
    /// Offsets stay queryable afterwards; reads and appends fail.
    pub fn close(&self) -> Result<()> {
        let mut segments = self.segments.write();
        Self::close_segments(&mut segments)
    }

    /// Close the log and delete its directory
    pub fn remove(&self) -> Result<()> {
        let mut segments = self.segments.write();
        self.remove_locked(&mut segments)
    }

    /// Remove the log, then set it up again from scratch
    pub fn reset(&self) -> Result<()> {
        let mut segments = self.segments.write();
        self.remove_locked(&mut segments)?;
        *segments = self.setup()?;
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Number of segments
    pub fn segment_count(&self) -> usize {
        self.segments.read().len()
    }

    /// Base offsets of all segments, ascending
    pub fn segment_base_offsets(&self) -> Vec<u64> {
        self.segments.read().iter().map(Segment::base_offset).collect()
    }

    /// Effective configuration (defaults applied)
    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Scan the directory and open one segment per distinct base offset
    ///
    /// Each base offset shows up twice (`.store` and `.index`); the set
    /// collapses them. An empty directory bootstraps a segment at the
    /// configured initial offset.
    fn setup(&self) -> Result<Vec<Segment>> {
        fs::create_dir_all(&self.dir).context("create log directory", &self.dir)?;

        let mut base_offsets = BTreeSet::new();
        for entry in fs::read_dir(&self.dir).context("read log directory", &self.dir)? {
            let path = entry.context("read log directory", &self.dir)?.path();
            if !path.is_file() {
                continue;
            }
            if let Some(base_offset) = parse_base_offset(&path) {
                base_offsets.insert(base_offset);
            }
        }

        let mut segments = Vec::with_capacity(base_offsets.len().max(1));
        for base_offset in base_offsets {
            segments.push(self.new_segment(base_offset)?);
        }

        if segments.is_empty() {
            let initial = self.config.segment.initial_offset;
            info!(dir = %self.dir.display(), initial_offset = initial, "bootstrapping empty log");
            segments.push(self.new_segment(initial)?);
        }

        info!(dir = %self.dir.display(), segments = segments.len(), "log ready");
        Ok(segments)
    }

    fn new_segment(&self, base_offset: u64) -> Result<Segment> {
        Segment::open(&self.dir, base_offset, &self.config, Arc::clone(&self.codec))
    }

    fn close_segments(segments: &mut [Segment]) -> Result<()> {
        for segment in segments.iter_mut() {
            segment.close()?;
        }
        Ok(())
    }

    fn remove_locked(&self, segments: &mut Vec<Segment>) -> Result<()> {
        Self::close_segments(segments)?;
        segments.clear();

        match fs::remove_dir_all(&self.dir) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            other => other.context("remove log directory", &self.dir)?,
        }

        info!(dir = %self.dir.display(), "removed log");
        Ok(())
    }
}
