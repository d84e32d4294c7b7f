//! Error types for duraq core.

use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in duraq core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] duraq_storage::StorageError),

    /// I/O error, including truncation (unexpected end of stream) while
    /// decoding a record payload.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The leading magic marker of a record did not match.
    ///
    /// This is the canonical corruption/misalignment signal: the byte
    /// source is not positioned at a record start, or the file is damaged.
    #[error("Header {observed:x} not expected value: {expected:x}")]
    BadHeader {
        /// The 4-byte value actually observed.
        observed: u32,
        /// The magic constant that was expected.
        expected: u32,
    },

    /// A record carried a type tag outside the known set.
    ///
    /// This is the canonical unsupported-format signal: the record was
    /// written by a newer format version, or corruption landed on the tag
    /// field. Distinct from [`CoreError::BadHeader`] so callers can apply
    /// different recovery policies.
    #[error("Unknown action {action:08x}")]
    UnknownRecordType {
        /// The offending tag, sign-extended to 32 bits.
        action: u32,
    },

    /// The log is corrupted or internally inconsistent.
    #[error("log corruption: {message}")]
    LogCorruption {
        /// Description of the corruption.
        message: String,
    },

    /// The channel is at capacity and cannot accept another event.
    #[error("channel is full: capacity {capacity}")]
    ChannelFull {
        /// The configured capacity.
        capacity: usize,
    },

    /// Another process holds the channel directory lock.
    #[error("channel locked: another process has exclusive access")]
    ChannelLocked,

    /// The channel directory layout is invalid.
    #[error("invalid channel directory: {message}")]
    InvalidDirectory {
        /// Description of the problem.
        message: String,
    },

    /// Operation not permitted in the current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why the operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates a bad-header error from the observed leading 4 bytes.
    #[must_use]
    pub fn bad_header(observed: u32, expected: u32) -> Self {
        Self::BadHeader { observed, expected }
    }

    /// Creates an unknown-record-type error from the raw wire tag.
    ///
    /// The tag is sign-extended so the diagnostic renders the full 32-bit
    /// two's-complement pattern (e.g. `i16::MIN` renders as `ffff8000`).
    #[must_use]
    pub fn unknown_record_type(tag: i16) -> Self {
        Self::UnknownRecordType {
            action: i32::from(tag) as u32,
        }
    }

    /// Creates a log corruption error.
    pub fn log_corruption(message: impl Into<String>) -> Self {
        Self::LogCorruption {
            message: message.into(),
        }
    }

    /// Creates an invalid directory error.
    pub fn invalid_directory(message: impl Into<String>) -> Self {
        Self::InvalidDirectory {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Whether this error is a truncation (unexpected end of stream).
    ///
    /// Recovery treats a truncated record at the tail of the log as "the
    /// last append never completed" rather than as corruption.
    #[must_use]
    pub fn is_truncation(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_header_message_renders_hex() {
        let err = CoreError::bad_header(0, 0xdead_beef);
        assert_eq!(err.to_string(), "Header 0 not expected value: deadbeef");
    }

    #[test]
    fn unknown_record_type_sign_extends() {
        let err = CoreError::unknown_record_type(i16::MIN);
        assert_eq!(err.to_string(), "Unknown action ffff8000");

        let err = CoreError::unknown_record_type(100);
        assert_eq!(err.to_string(), "Unknown action 00000064");
    }

    #[test]
    fn truncation_detection() {
        let eof = CoreError::Io(io::Error::new(io::ErrorKind::UnexpectedEof, "eof"));
        assert!(eof.is_truncation());

        let other = CoreError::log_corruption("mangled");
        assert!(!other.is_truncation());
    }
}
