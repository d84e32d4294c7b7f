//! WAL writer.

use crate::error::CoreResult;
use crate::wal::iterator::{GuardedReader, LogIterator};
use crate::wal::record::Record;
use duraq_storage::StorageBackend;
use parking_lot::Mutex;
use std::sync::Arc;

/// Manages appends to and reads from the write-ahead log.
///
/// All access to the backend goes through a single mutex: each record's
/// bytes land as one contiguous append, so records of concurrent
/// transactions interleave at the record level, never at the byte level.
pub struct WalManager {
    /// Storage backend holding the log bytes.
    backend: Arc<Mutex<Box<dyn StorageBackend>>>,
}

impl WalManager {
    /// Creates a WAL manager over the given backend.
    pub fn new(backend: Box<dyn StorageBackend>) -> Self {
        Self {
            backend: Arc::new(Mutex::new(backend)),
        }
    }

    /// Encodes and appends a record, returning the offset it was written at.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails (oversized field) or the backend
    /// write fails.
    pub fn append(&self, record: &Record) -> CoreResult<u64> {
        let data = record.encode()?;
        let mut backend = self.backend.lock();
        let offset = backend.append(&data)?;
        tracing::trace!(
            offset,
            record_type = ?record.record_type(),
            txid = %record.transaction_id(),
            "appended record"
        );
        Ok(offset)
    }

    /// Flushes buffered log writes to the operating system.
    pub fn flush(&self) -> CoreResult<()> {
        self.backend.lock().flush()?;
        Ok(())
    }

    /// Syncs the log to durable media.
    pub fn sync(&self) -> CoreResult<()> {
        self.backend.lock().sync()?;
        Ok(())
    }

    /// Returns the current log size in bytes.
    pub fn size(&self) -> CoreResult<u64> {
        Ok(self.backend.lock().size()?)
    }

    /// Decodes the single record that starts at `offset`.
    ///
    /// Used by the take path to load an event back from its enqueue record.
    ///
    /// # Errors
    ///
    /// Returns an error if `offset` does not point at a well-formed record.
    pub fn read_record_at(&self, offset: u64) -> CoreResult<Record> {
        let backend = self.backend.lock();
        let mut reader = GuardedReader::new(backend, offset)?;
        Record::decode(&mut reader)
    }

    /// Returns a streaming iterator over the whole log.
    ///
    /// The iterator holds the backend lock until it is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be accessed.
    pub fn iter(&self) -> CoreResult<LogIterator<'_>> {
        LogIterator::new(self.backend.lock(), 0)
    }

    /// Reads all records into memory.
    ///
    /// Prefer [`WalManager::iter`] for large logs; this is a convenience
    /// for tests and tooling.
    pub fn read_all(&self) -> CoreResult<Vec<(u64, Record)>> {
        self.iter()?.collect()
    }

    /// Truncates the log to `size` bytes.
    pub fn truncate(&self, size: u64) -> CoreResult<()> {
        self.backend.lock().truncate(size)?;
        Ok(())
    }

    /// Discards the entire log.
    ///
    /// Only sound when the queue is empty and no transactions are active;
    /// [`crate::Channel::compact`] enforces that.
    pub fn clear(&self) -> CoreResult<()> {
        self.truncate(0)
    }

    /// Returns the backend for direct manipulation in tests.
    #[cfg(test)]
    pub(crate) fn backend_for_testing(&self) -> Arc<Mutex<Box<dyn StorageBackend>>> {
        Arc::clone(&self.backend)
    }
}

impl std::fmt::Debug for WalManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalManager").finish_non_exhaustive()
    }
}
