//! Log Reader
//!
//! Sequential byte stream over the raw store files of every segment.

use std::io::{self, Read};
use std::sync::Arc;

use crate::error::LogError;
use crate::storage::Store;

/// Concatenated stream of all segment stores, in segment order
pub struct LogReader {
    readers: Vec<SegmentReader>,
    /// Index of the segment currently being read
    current: usize,
}

impl LogReader {
    pub(super) fn new(readers: Vec<SegmentReader>) -> Self {
        Self { readers, current: 0 }
    }
}

impl Read for LogReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        while let Some(reader) = self.readers.get_mut(self.current) {
            let n = reader.read(buf)?;
            if n > 0 {
                return Ok(n);
            }
            // This segment is exhausted; move on to the next one
            self.current += 1;
        }

        Ok(0)
    }
}

/// Reads one store from byte 0 to its end
///
/// End of data in the store ends this reader cleanly (`Ok(0)`) rather than
/// surfacing as an error.
pub struct SegmentReader {
    store: Arc<Store>,
    /// Read cursor within the store
    offset: u64,
}

impl SegmentReader {
    pub(super) fn new(store: Arc<Store>) -> Self {
        Self { store, offset: 0 }
    }
}

impl Read for SegmentReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.store.read_at(buf, self.offset) {
            Ok(n) => {
                self.offset += n as u64;
                Ok(n)
            }
            Err(LogError::EndOfData) => Ok(0),
            Err(e) => Err(io::Error::other(e)),
        }
    }
}
