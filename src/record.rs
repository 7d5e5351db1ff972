//! Records and record codecs
//!
//! The log treats records as opaque: a payload plus the offset assigned at
//! append time. Turning a record into store bytes is the job of a
//! [`RecordCodec`], injected when the log is opened.

use serde::{Deserialize, Serialize};

use crate::error::{LogError, Result};

/// A single entry in the log
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Record {
    /// Opaque payload
    pub value: Vec<u8>,

    /// Absolute offset, assigned by the segment on append
    pub offset: u64,
}

impl Record {
    /// Create a record with an unassigned offset
    pub fn new(value: impl Into<Vec<u8>>) -> Self {
        Self {
            value: value.into(),
            offset: 0,
        }
    }
}

/// Serializes records to and from the bytes kept in a store
pub trait RecordCodec: Send + Sync {
    fn encode(&self, record: &Record) -> Result<Vec<u8>>;

    fn decode(&self, bytes: &[u8]) -> Result<Record>;
}

/// Default codec: bincode with its standard (fixed-int, little-endian) options
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl RecordCodec for BincodeCodec {
    fn encode(&self, record: &Record) -> Result<Vec<u8>> {
        bincode::serialize(record).map_err(|e| LogError::Serialization(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Record> {
        bincode::deserialize(bytes).map_err(|e| LogError::Serialization(e.to_string()))
    }
}
