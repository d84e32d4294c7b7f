//! Streaming WAL record iterator.
//!
//! Reads records one-by-one from the storage backend with O(1) memory.
//! Because the format has no length prefix, a record's extent is only
//! known once it has been decoded — the iterator therefore implements
//! [`std::io::Read`] over the backend and feeds itself to the record
//! decoder, tracking how many bytes each record consumed.

use crate::error::CoreResult;
use crate::wal::record::Record;
use duraq_storage::StorageBackend;
use parking_lot::MutexGuard;
use std::io;

/// Chunk size for backend reads.
const READ_CHUNK: usize = 64 * 1024;

/// A buffered reader over a locked storage backend.
///
/// Tracks the absolute offset of the next byte handed to the consumer, so
/// callers can tell where one record ends and the next begins.
pub(crate) struct GuardedReader<'a> {
    backend: MutexGuard<'a, Box<dyn StorageBackend>>,
    size: u64,
    /// Absolute offset of the first byte not yet fetched from the backend.
    fetched: u64,
    buffer: Vec<u8>,
    buffer_pos: usize,
}

impl<'a> GuardedReader<'a> {
    pub(crate) fn new(
        backend: MutexGuard<'a, Box<dyn StorageBackend>>,
        start: u64,
    ) -> CoreResult<Self> {
        let size = backend.size()?;
        Ok(Self {
            backend,
            size,
            fetched: start,
            buffer: Vec::new(),
            buffer_pos: 0,
        })
    }

    /// Absolute offset of the next byte the consumer will receive.
    pub(crate) fn position(&self) -> u64 {
        self.fetched - (self.buffer.len() - self.buffer_pos) as u64
    }

    pub(crate) fn size(&self) -> u64 {
        self.size
    }
}

impl io::Read for GuardedReader<'_> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if self.buffer_pos == self.buffer.len() {
            let remaining = self.size.saturating_sub(self.fetched);
            if remaining == 0 {
                return Ok(0);
            }
            let chunk = remaining.min(READ_CHUNK as u64) as usize;
            let data = self
                .backend
                .read_at(self.fetched, chunk)
                .map_err(|e| io::Error::other(e.to_string()))?;
            self.fetched += data.len() as u64;
            self.buffer = data;
            self.buffer_pos = 0;
        }

        let n = (self.buffer.len() - self.buffer_pos).min(out.len());
        out[..n].copy_from_slice(&self.buffer[self.buffer_pos..self.buffer_pos + n]);
        self.buffer_pos += n;
        Ok(n)
    }
}

/// A streaming iterator over WAL records.
///
/// Yields `(offset, record)` pairs in log order. Holds the backend lock
/// for its lifetime, so no appends can interleave with a scan.
///
/// # Recovery Policy
///
/// - A record cut off at the tail of the log (underrun) ends iteration
///   cleanly — the append never completed before a crash.
/// - Bad magic or an unknown type tag yields the error and ends iteration;
///   the caller decides whether to stop replay or treat the log as ended
///   at that offset.
pub struct LogIterator<'a> {
    reader: GuardedReader<'a>,
    /// End offset of the last fully decoded record.
    valid_end: u64,
    finished: bool,
}

impl<'a> LogIterator<'a> {
    /// Creates an iterator starting at `start_offset` (usually 0).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend size cannot be determined.
    pub(crate) fn new(
        backend: MutexGuard<'a, Box<dyn StorageBackend>>,
        start_offset: u64,
    ) -> CoreResult<Self> {
        Ok(Self {
            reader: GuardedReader::new(backend, start_offset)?,
            valid_end: start_offset,
            finished: false,
        })
    }

    /// End offset of the last fully decoded record.
    ///
    /// After a scan that ended at a torn record, this is where the torn
    /// record starts — the offset the log must be truncated to before any
    /// further append.
    #[must_use]
    pub fn valid_end(&self) -> u64 {
        self.valid_end
    }

    fn read_next(&mut self) -> CoreResult<Option<(u64, Record)>> {
        if self.finished {
            return Ok(None);
        }

        let start = self.reader.position();
        if start >= self.reader.size() {
            self.finished = true;
            return Ok(None);
        }

        match Record::decode(&mut self.reader) {
            Ok(record) => {
                self.valid_end = self.reader.position();
                Ok(Some((start, record)))
            }
            Err(e) if e.is_truncation() => {
                // Partial record at the tail: discard it, end the scan.
                self.finished = true;
                Ok(None)
            }
            Err(e) => {
                self.finished = true;
                Err(e)
            }
        }
    }
}

impl Iterator for LogIterator<'_> {
    type Item = CoreResult<(u64, Record)>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_next() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
