//! Core type definitions for duraq.

use std::fmt;

/// Unique identifier for a transaction.
///
/// Transaction IDs are monotonically increasing and never reused within a
/// log. Every record belonging to the same logical transaction carries the
/// same ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransactionId(pub u64);

impl TransactionId {
    /// Creates a new transaction ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn:{}", self.0)
    }
}

/// Identifier of a log file.
///
/// Dequeue records name the file an event was originally enqueued in, so a
/// replayer can resolve the reference even when a channel spans several
/// log files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FileId(pub u64);

impl FileId {
    /// Creates a new file ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file:{}", self.0)
    }
}

/// Location of a committed enqueue record in the log.
///
/// The in-memory queue holds these instead of event payloads: the event
/// bytes stay in the log and are read back on take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventPtr {
    /// The log file holding the enqueue record.
    pub file_id: FileId,
    /// Byte offset of the record within that file.
    pub offset: u64,
}

impl EventPtr {
    /// Creates a new event pointer.
    #[must_use]
    pub const fn new(file_id: FileId, offset: u64) -> Self {
        Self { file_id, offset }
    }
}

impl fmt::Display for EventPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.file_id, self.offset)
    }
}

/// Returns the current wall-clock time in milliseconds since the Unix epoch.
#[must_use]
pub fn now_millis() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_id_ordering() {
        assert!(TransactionId::new(1) < TransactionId::new(2));
    }

    #[test]
    fn event_ptr_display() {
        let ptr = EventPtr::new(FileId::new(3), 128);
        assert_eq!(format!("{ptr}"), "file:3@128");
    }

    #[test]
    fn now_millis_is_nonzero() {
        assert!(now_millis() > 0);
    }
}
