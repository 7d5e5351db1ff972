//! Tests for Segment
//!
//! These tests verify:
//! - Offset assignment from the base offset
//! - Rotation limits (index full, store full)
//! - Recovering next_offset from persisted files
//! - Removing a segment's files

use std::path::Path;
use std::sync::Arc;

use segmentlog::storage::{index_path, store_path, Segment, ENTRY_WIDTH, LEN_WIDTH};
use segmentlog::{BincodeCodec, Config, LogError, Record, RecordCodec};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn codec() -> Arc<dyn RecordCodec> {
    Arc::new(BincodeCodec)
}

fn want() -> Record {
    Record::new("hello world")
}

fn open(dir: &Path, base_offset: u64, config: &Config) -> Segment {
    Segment::open(dir, base_offset, config, codec()).unwrap()
}

// =============================================================================
// Lifecycle Test
// =============================================================================

#[test]
fn test_segment_lifecycle() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();

    let config = Config::builder()
        .max_store_bytes(1024)
        .max_index_bytes(ENTRY_WIDTH * 3)
        .build();

    let mut segment = open(dir, 16, &config);
    assert_eq!(segment.base_offset(), 16);
    assert_eq!(segment.next_offset(), 16);
    assert!(!segment.is_maxed());

    for i in 0..3u64 {
        let mut record = want();
        let off = segment.append(&mut record).unwrap();
        assert_eq!(off, 16 + i);
        assert_eq!(record.offset, off);

        let got = segment.read(off).unwrap();
        assert_eq!(got.value, want().value);
        assert_eq!(got.offset, off);
    }

    // Index is full
    let err = segment.append(&mut want()).unwrap_err();
    assert!(err.is_end_of_data());
    assert!(segment.is_maxed());
    segment.close().unwrap();

    // Reload from the persisted index and store; the store limit is now the one hit
    let config = Config::builder()
        .max_store_bytes(want().value.len() as u64 * 3)
        .max_index_bytes(1024)
        .build();

    let mut segment = open(dir, 16, &config);
    assert_eq!(segment.next_offset(), 19);
    assert!(segment.is_maxed());

    segment.remove().unwrap();
    assert!(!store_path(dir, 16).exists());
    assert!(!index_path(dir, 16).exists());

    let segment = open(dir, 16, &config);
    assert_eq!(segment.next_offset(), 16);
    assert!(!segment.is_maxed());
}

// =============================================================================
// Read Tests
// =============================================================================

#[test]
fn test_read_below_base_offset() {
    let temp = TempDir::new().unwrap();
    let mut segment = open(temp.path(), 10, &Config::default());
    segment.append(&mut want()).unwrap();

    let err = segment.read(9).unwrap_err();
    assert!(matches!(err, LogError::OffsetOutOfRange { offset: 9 }));
}

#[test]
fn test_read_unwritten_offset() {
    let temp = TempDir::new().unwrap();
    let mut segment = open(temp.path(), 0, &Config::default());
    segment.append(&mut want()).unwrap();

    assert!(segment.read(1).unwrap_err().is_end_of_data());
    assert!(!segment.contains(1));
    assert!(segment.contains(0));
}

// =============================================================================
// Sizing Tests
// =============================================================================

#[test]
fn test_sizes_track_appends() {
    let temp = TempDir::new().unwrap();
    let mut segment = open(temp.path(), 0, &Config::default());

    let mut record = want();
    let encoded = BincodeCodec.encode(&record).unwrap();
    segment.append(&mut record).unwrap();

    assert_eq!(segment.store_size(), LEN_WIDTH + encoded.len() as u64);
    assert_eq!(segment.index_size(), ENTRY_WIDTH);
}

#[test]
fn test_store_limit_maxes_segment() {
    let temp = TempDir::new().unwrap();
    let config = Config::builder().max_store_bytes(32).build();
    let mut segment = open(temp.path(), 0, &config);

    segment.append(&mut want()).unwrap();

    // One framed "hello world" record is already past 32 bytes
    assert!(segment.store_size() >= 32);
    assert!(segment.is_maxed());
}

#[test]
fn test_full_index_leaves_store_untouched() {
    let temp = TempDir::new().unwrap();
    let config = Config::builder().max_index_bytes(ENTRY_WIDTH * 2).build();
    let mut segment = open(temp.path(), 0, &config);

    segment.append(&mut want()).unwrap();
    segment.append(&mut want()).unwrap();
    let store_size = segment.store_size();

    let mut record = want();
    assert!(segment.append(&mut record).unwrap_err().is_end_of_data());

    assert_eq!(segment.store_size(), store_size);
    assert_eq!(segment.next_offset(), 2);
    assert_eq!(record.offset, 0);

    // The raw store holds exactly the two indexed frames
    let store = segment.store();
    let mut pos = 0;
    let mut frames = 0;
    while let Ok(bytes) = store.read(pos) {
        pos += LEN_WIDTH + bytes.len() as u64;
        frames += 1;
    }
    assert_eq!(frames, 2);
    assert_eq!(pos, store_size);
}

// =============================================================================
// Codec Failure Tests
// =============================================================================

struct FailingCodec;

impl RecordCodec for FailingCodec {
    fn encode(&self, _record: &Record) -> segmentlog::Result<Vec<u8>> {
        Err(LogError::Serialization("refused".to_string()))
    }

    fn decode(&self, _bytes: &[u8]) -> segmentlog::Result<Record> {
        Err(LogError::Serialization("refused".to_string()))
    }
}

#[test]
fn test_encode_failure_leaves_segment_untouched() {
    let temp = TempDir::new().unwrap();
    let mut segment = Segment::open(temp.path(), 0, &Config::default(), Arc::new(FailingCodec)).unwrap();

    let err = segment.append(&mut want()).unwrap_err();

    assert!(matches!(err, LogError::Serialization(_)));
    assert_eq!(segment.next_offset(), 0);
    assert_eq!(segment.store_size(), 0);
    assert_eq!(segment.index_size(), 0);
}
