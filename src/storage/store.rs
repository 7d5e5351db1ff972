//! Store
//!
//! Append-only record file. Every record is framed with an 8-byte big-endian
//! length prefix and written through a buffered writer; reads flush first so
//! they always observe buffered appends.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::{IoContext, LogError, Result};

use super::LEN_WIDTH;

/// Framed, buffered, append-only record file
///
/// ## Concurrency:
/// - One mutex guards the writer, the file handle and `size`, so a flush can
///   never interleave with a positioned read and expose a torn record.
/// - All methods use `&self`; the store can be shared with stream readers.
pub struct Store {
    /// Backing file path
    path: PathBuf,

    /// Writer + size, behind the store lock
    inner: Mutex<StoreInner>,
}

struct StoreInner {
    /// Buffered writer over the file; `None` once closed
    writer: Option<BufWriter<File>>,

    /// Bytes appended so far, flushed or not
    size: u64,
}

impl Store {
    /// Open or create a store file
    ///
    /// The running size starts at the current file length, so a reopened
    /// store continues appending after its existing records.
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)
            .context("open store", path)?;

        let size = file.metadata().context("stat store", path)?.len();
        debug!(path = %path.display(), size, "opened store");

        Ok(Self {
            path: path.to_path_buf(),
            inner: Mutex::new(StoreInner {
                writer: Some(BufWriter::new(file)),
                size,
            }),
        })
    }

    /// Append a payload
    ///
    /// Returns `(bytes_written, position)`: the framed length (prefix +
    /// payload) and the byte position the record starts at.
    pub fn append(&self, payload: &[u8]) -> Result<(u64, u64)> {
        let mut inner = self.inner.lock();
        let StoreInner { writer, size } = &mut *inner;
        let writer = writer.as_mut().ok_or(LogError::Closed)?;

        let position = *size;
        writer
            .write_all(&(payload.len() as u64).to_be_bytes())
            .context("write record length to", &self.path)?;
        writer
            .write_all(payload)
            .context("write record to", &self.path)?;

        let written = LEN_WIDTH + payload.len() as u64;
        *size += written;

        Ok((written, position))
    }

    /// Read the record that starts at `position`
    ///
    /// Fails with [`LogError::EndOfData`] if the frame extends past the end
    /// of the store.
    pub fn read(&self, position: u64) -> Result<Vec<u8>> {
        let mut inner = self.inner.lock();
        let StoreInner { writer, size } = &mut *inner;
        let writer = writer.as_mut().ok_or(LogError::Closed)?;
        writer.flush().context("flush store", &self.path)?;

        let payload_start = position
            .checked_add(LEN_WIDTH)
            .filter(|end| *end <= *size)
            .ok_or(LogError::EndOfData)?;

        let file = writer.get_ref();
        let mut len_bytes = [0u8; LEN_WIDTH as usize];
        read_exact_at(file, &mut len_bytes, position).context("read record length from", &self.path)?;
        let len = u64::from_be_bytes(len_bytes);

        // A length pointing past the end means the frame was never fully written
        let payload_len = payload_start
            .checked_add(len)
            .filter(|end| *end <= *size)
            .and_then(|_| usize::try_from(len).ok())
            .ok_or(LogError::EndOfData)?;

        let mut payload = vec![0u8; payload_len];
        read_exact_at(file, &mut payload, payload_start).context("read record from", &self.path)?;

        Ok(payload)
    }

    /// Raw positioned read of up to `buf.len()` bytes starting at `offset`
    ///
    /// Returns the number of bytes read, which is short only at the end of
    /// the store. An `offset` at or past the end yields [`LogError::EndOfData`].
    pub fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        let mut inner = self.inner.lock();
        let StoreInner { writer, size } = &mut *inner;
        let writer = writer.as_mut().ok_or(LogError::Closed)?;
        writer.flush().context("flush store", &self.path)?;

        if offset >= *size {
            return Err(LogError::EndOfData);
        }
        if buf.is_empty() {
            return Ok(0);
        }

        let available = *size - offset;
        let n = usize::try_from(available).map_or(buf.len(), |a| a.min(buf.len()));
        read_exact_at(writer.get_ref(), &mut buf[..n], offset).context("read from", &self.path)?;

        Ok(n)
    }

    /// Flush buffered records, sync the file and close it
    ///
    /// Closing an already closed store is a no-op.
    pub fn close(&self) -> Result<()> {
        let Some(writer) = self.inner.lock().writer.take() else {
            return Ok(());
        };

        let file = writer
            .into_inner()
            .map_err(|e| e.into_error())
            .context("flush store", &self.path)?;
        file.sync_all().context("sync store", &self.path)?;

        debug!(path = %self.path.display(), "closed store");
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Bytes appended so far, including any still buffered
    pub fn size(&self) -> u64 {
        self.inner.lock().size
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether [`Store::close`] has run
    pub fn is_closed(&self) -> bool {
        self.inner.lock().writer.is_none()
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(path = %self.path.display(), error = %e, "failed to close store on drop");
        }
    }
}

/// Seek-and-read on a shared file handle
///
/// The file is opened in append mode, so moving the cursor here never
/// affects where buffered writes land.
fn read_exact_at(mut file: &File, buf: &mut [u8], position: u64) -> io::Result<()> {
    file.seek(SeekFrom::Start(position))?;
    file.read_exact(buf)
}
