//! WAL record types and the on-disk codec.

use crate::error::{CoreError, CoreResult};
use crate::event::Event;
use crate::types::{now_millis, FileId, TransactionId};
use std::collections::HashMap;
use std::io::Read;

/// Magic marker written ahead of every record.
///
/// Changing this constant is a breaking format version bump.
pub const RECORD_MAGIC: u32 = 0xdead_beef;

/// Fixed header size: magic (4) + type tag (2) + transaction id (8).
pub const HEADER_SIZE: usize = 14;

/// Cap on the initial buffer allocation for length-prefixed fields.
/// A corrupt length fails with an underrun before the buffer grows far.
const MAX_PREALLOC: usize = 64 * 1024;

/// Type of a WAL record.
///
/// The tag space is closed: every value outside these four is invalid and
/// decoding it is an error, never a silent no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i16)]
pub enum RecordType {
    /// An event was added to the queue.
    Enqueue = 1,
    /// A previously enqueued event was removed from the queue.
    Dequeue = 2,
    /// The transaction's effects must be discarded on replay.
    Abort = 3,
    /// The transaction's effects are durable and must be applied on replay.
    Commit = 4,
}

impl RecordType {
    /// Converts a wire tag to a record type.
    pub fn from_tag(tag: i16) -> Option<Self> {
        match tag {
            1 => Some(Self::Enqueue),
            2 => Some(Self::Dequeue),
            3 => Some(Self::Abort),
            4 => Some(Self::Commit),
            _ => None,
        }
    }

    /// Returns the wire tag for this record type.
    #[must_use]
    pub const fn as_tag(self) -> i16 {
        self as i16
    }
}

/// A WAL record: one mutation of the channel.
///
/// Every variant carries the transaction it belongs to and a wall-clock
/// timestamp. The timestamp may be updated with [`Record::set_timestamp`]
/// up to the point the record is encoded; replay never mutates a decoded
/// record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// An event was added to the queue under this transaction.
    Enqueue {
        /// Owning transaction.
        txid: TransactionId,
        /// Wall-clock milliseconds at creation.
        timestamp: u64,
        /// The enqueued event.
        event: Event,
    },

    /// The event at the referenced log location was removed from the queue
    /// under this transaction.
    Dequeue {
        /// Owning transaction.
        txid: TransactionId,
        /// Wall-clock milliseconds at creation.
        timestamp: u64,
        /// Log file the event was enqueued in.
        file_id: FileId,
        /// Byte offset of the enqueue record within that file.
        offset: u64,
    },

    /// Discard this transaction's effects on replay.
    Abort {
        /// Owning transaction.
        txid: TransactionId,
        /// Wall-clock milliseconds at creation.
        timestamp: u64,
    },

    /// Apply this transaction's effects on replay.
    ///
    /// Structurally identical to [`Record::Abort`]; the tag alone carries
    /// the outcome, which is why the two are distinct variants.
    Commit {
        /// Owning transaction.
        txid: TransactionId,
        /// Wall-clock milliseconds at creation.
        timestamp: u64,
    },
}

impl Record {
    /// Creates an enqueue record stamped with the current time.
    #[must_use]
    pub fn enqueue(txid: TransactionId, event: Event) -> Self {
        Self::Enqueue {
            txid,
            timestamp: now_millis(),
            event,
        }
    }

    /// Creates a dequeue record stamped with the current time.
    #[must_use]
    pub fn dequeue(txid: TransactionId, file_id: FileId, offset: u64) -> Self {
        Self::Dequeue {
            txid,
            timestamp: now_millis(),
            file_id,
            offset,
        }
    }

    /// Creates an abort record stamped with the current time.
    #[must_use]
    pub fn abort(txid: TransactionId) -> Self {
        Self::Abort {
            txid,
            timestamp: now_millis(),
        }
    }

    /// Creates a commit record stamped with the current time.
    #[must_use]
    pub fn commit(txid: TransactionId) -> Self {
        Self::Commit {
            txid,
            timestamp: now_millis(),
        }
    }

    /// Returns the record type.
    #[must_use]
    pub fn record_type(&self) -> RecordType {
        match self {
            Self::Enqueue { .. } => RecordType::Enqueue,
            Self::Dequeue { .. } => RecordType::Dequeue,
            Self::Abort { .. } => RecordType::Abort,
            Self::Commit { .. } => RecordType::Commit,
        }
    }

    /// Returns the owning transaction's ID.
    #[must_use]
    pub fn transaction_id(&self) -> TransactionId {
        match self {
            Self::Enqueue { txid, .. }
            | Self::Dequeue { txid, .. }
            | Self::Abort { txid, .. }
            | Self::Commit { txid, .. } => *txid,
        }
    }

    /// Returns the record's timestamp (wall-clock milliseconds).
    #[must_use]
    pub fn timestamp(&self) -> u64 {
        match self {
            Self::Enqueue { timestamp, .. }
            | Self::Dequeue { timestamp, .. }
            | Self::Abort { timestamp, .. }
            | Self::Commit { timestamp, .. } => *timestamp,
        }
    }

    /// Updates the record's timestamp.
    ///
    /// Valid until the record is encoded; once appended, the bytes on disk
    /// are immutable.
    pub fn set_timestamp(&mut self, millis: u64) {
        match self {
            Self::Enqueue { timestamp, .. }
            | Self::Dequeue { timestamp, .. }
            | Self::Abort { timestamp, .. }
            | Self::Commit { timestamp, .. } => *timestamp = millis,
        }
    }

    /// Serializes the record: header, then the variant's own fields.
    ///
    /// # Errors
    ///
    /// Fails only if a header count, header string, or body would overflow
    /// its 32-bit length prefix.
    pub fn encode(&self) -> CoreResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(HEADER_SIZE + 8);

        buf.extend_from_slice(&RECORD_MAGIC.to_be_bytes());
        buf.extend_from_slice(&self.record_type().as_tag().to_be_bytes());
        buf.extend_from_slice(&self.transaction_id().as_u64().to_be_bytes());

        match self {
            Self::Enqueue {
                timestamp, event, ..
            } => {
                buf.extend_from_slice(&timestamp.to_be_bytes());

                let count = u32::try_from(event.headers().len()).map_err(|_| {
                    CoreError::invalid_operation("event has too many headers to encode")
                })?;
                buf.extend_from_slice(&count.to_be_bytes());
                for (key, value) in event.headers() {
                    write_prefixed(&mut buf, key.as_bytes())?;
                    write_prefixed(&mut buf, value.as_bytes())?;
                }

                write_prefixed(&mut buf, event.body())?;
            }

            Self::Dequeue {
                timestamp,
                file_id,
                offset,
                ..
            } => {
                buf.extend_from_slice(&timestamp.to_be_bytes());
                buf.extend_from_slice(&file_id.as_u64().to_be_bytes());
                buf.extend_from_slice(&offset.to_be_bytes());
            }

            Self::Abort { timestamp, .. } | Self::Commit { timestamp, .. } => {
                buf.extend_from_slice(&timestamp.to_be_bytes());
            }
        }

        Ok(buf)
    }

    /// Reads one record from a byte source.
    ///
    /// Validation happens in a strict order: magic first, then the type
    /// tag, then the payload. This lets a caller distinguish "not a record
    /// at all" from "a record of an unknown format" from "a record cut off
    /// mid-write" — three different recovery policies.
    ///
    /// # Errors
    ///
    /// - [`CoreError::BadHeader`] if the leading 4 bytes are not the magic
    /// - [`CoreError::UnknownRecordType`] if the tag is outside the four
    ///   reserved values
    /// - [`CoreError::Io`] with `UnexpectedEof` if the source ends before
    ///   the record is complete
    pub fn decode<R: Read>(reader: &mut R) -> CoreResult<Self> {
        let magic = read_u32(reader)?;
        if magic != RECORD_MAGIC {
            return Err(CoreError::bad_header(magic, RECORD_MAGIC));
        }

        let tag = read_i16(reader)?;
        let txid = TransactionId::new(read_u64(reader)?);

        let record_type =
            RecordType::from_tag(tag).ok_or_else(|| CoreError::unknown_record_type(tag))?;

        let record = match record_type {
            RecordType::Enqueue => {
                let timestamp = read_u64(reader)?;

                let count = read_u32(reader)? as usize;
                let mut headers = HashMap::with_capacity(count.min(MAX_PREALLOC / 16));
                for _ in 0..count {
                    let key = read_string(reader)?;
                    let value = read_string(reader)?;
                    headers.insert(key, value);
                }

                let body = read_prefixed(reader)?;

                Self::Enqueue {
                    txid,
                    timestamp,
                    event: Event::new(headers, body),
                }
            }

            RecordType::Dequeue => Self::Dequeue {
                txid,
                timestamp: read_u64(reader)?,
                file_id: FileId::new(read_u64(reader)?),
                offset: read_u64(reader)?,
            },

            RecordType::Abort => Self::Abort {
                txid,
                timestamp: read_u64(reader)?,
            },

            RecordType::Commit => Self::Commit {
                txid,
                timestamp: read_u64(reader)?,
            },
        };

        Ok(record)
    }
}

fn write_prefixed(buf: &mut Vec<u8>, data: &[u8]) -> CoreResult<()> {
    let len = u32::try_from(data.len())
        .map_err(|_| CoreError::invalid_operation("field exceeds 32-bit length prefix"))?;
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(data);
    Ok(())
}

fn read_i16<R: Read>(reader: &mut R) -> CoreResult<i16> {
    let mut bytes = [0u8; 2];
    reader.read_exact(&mut bytes)?;
    Ok(i16::from_be_bytes(bytes))
}

fn read_u32<R: Read>(reader: &mut R) -> CoreResult<u32> {
    let mut bytes = [0u8; 4];
    reader.read_exact(&mut bytes)?;
    Ok(u32::from_be_bytes(bytes))
}

fn read_u64<R: Read>(reader: &mut R) -> CoreResult<u64> {
    let mut bytes = [0u8; 8];
    reader.read_exact(&mut bytes)?;
    Ok(u64::from_be_bytes(bytes))
}

fn read_vec<R: Read>(reader: &mut R, len: usize) -> CoreResult<Vec<u8>> {
    let mut buf = Vec::with_capacity(len.min(MAX_PREALLOC));
    let read = reader.by_ref().take(len as u64).read_to_end(&mut buf)?;
    if read != len {
        return Err(CoreError::Io(std::io::ErrorKind::UnexpectedEof.into()));
    }
    Ok(buf)
}

fn read_prefixed<R: Read>(reader: &mut R) -> CoreResult<Vec<u8>> {
    let len = read_u32(reader)? as usize;
    read_vec(reader, len)
}

fn read_string<R: Read>(reader: &mut R) -> CoreResult<String> {
    String::from_utf8(read_prefixed(reader)?)
        .map_err(|_| CoreError::log_corruption("event header is not valid UTF-8"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn round_trip(record: &Record) -> Record {
        let bytes = record.encode().unwrap();
        Record::decode(&mut Cursor::new(bytes)).unwrap()
    }

    #[test]
    fn record_types() {
        assert_eq!(
            Record::enqueue(TransactionId::new(1), Event::default())
                .record_type()
                .as_tag(),
            1
        );
        assert_eq!(
            Record::dequeue(TransactionId::new(1), FileId::new(0), 0)
                .record_type()
                .as_tag(),
            2
        );
        assert_eq!(Record::abort(TransactionId::new(1)).record_type().as_tag(), 3);
        assert_eq!(
            Record::commit(TransactionId::new(1)).record_type().as_tag(),
            4
        );
    }

    #[test]
    fn tag_mapping_round_trip() {
        for t in [
            RecordType::Enqueue,
            RecordType::Dequeue,
            RecordType::Abort,
            RecordType::Commit,
        ] {
            assert_eq!(RecordType::from_tag(t.as_tag()), Some(t));
        }
        assert_eq!(RecordType::from_tag(0), None);
        assert_eq!(RecordType::from_tag(5), None);
        assert_eq!(RecordType::from_tag(i16::MIN), None);
    }

    #[test]
    fn enqueue_empty_event_round_trip() {
        let mut record = Record::enqueue(TransactionId::new(42), Event::default());
        record.set_timestamp(1_700_000_000_000);

        let decoded = round_trip(&record);
        assert_eq!(decoded.record_type(), RecordType::Enqueue);
        assert_eq!(decoded.transaction_id(), TransactionId::new(42));
        assert_eq!(decoded.timestamp(), 1_700_000_000_000);
        if let Record::Enqueue { event, .. } = decoded {
            assert!(event.headers().is_empty());
            assert!(event.body().is_empty());
        } else {
            panic!("expected Enqueue");
        }
    }

    #[test]
    fn enqueue_with_data_round_trip() {
        let mut headers = HashMap::new();
        headers.insert("host".to_string(), "node-1".to_string());
        headers.insert("source".to_string(), "syslog".to_string());
        let event = Event::new(headers.clone(), b"a log line".to_vec());

        let record = Record::enqueue(TransactionId::new(7), event);
        let decoded = round_trip(&record);

        assert_eq!(decoded, record);
        if let Record::Enqueue { event, .. } = decoded {
            assert_eq!(event.headers(), &headers);
            assert_eq!(event.body(), b"a log line");
        } else {
            panic!("expected Enqueue");
        }
    }

    #[test]
    fn dequeue_round_trip() {
        let mut record = Record::dequeue(TransactionId::new(3), FileId::new(10), 20);
        record.set_timestamp(5000);

        let decoded = round_trip(&record);
        assert_eq!(decoded.record_type(), RecordType::Dequeue);
        assert_eq!(decoded.transaction_id(), TransactionId::new(3));
        assert_eq!(decoded.timestamp(), 5000);
        if let Record::Dequeue {
            file_id, offset, ..
        } = decoded
        {
            assert_eq!(file_id, FileId::new(10));
            assert_eq!(offset, 20);
        } else {
            panic!("expected Dequeue");
        }
    }

    #[test]
    fn abort_round_trip() {
        let mut record = Record::abort(TransactionId::new(9));
        record.set_timestamp(123);

        let decoded = round_trip(&record);
        assert_eq!(decoded.record_type(), RecordType::Abort);
        assert_eq!(decoded.transaction_id(), TransactionId::new(9));
        assert_eq!(decoded.timestamp(), 123);
    }

    #[test]
    fn commit_round_trip() {
        let mut record = Record::commit(TransactionId::new(11));
        record.set_timestamp(456);

        let decoded = round_trip(&record);
        assert_eq!(decoded.record_type(), RecordType::Commit);
        assert_eq!(decoded.transaction_id(), TransactionId::new(11));
        assert_eq!(decoded.timestamp(), 456);
    }

    #[test]
    fn transaction_ids_do_not_cross_contaminate() {
        let records = [
            Record::enqueue(TransactionId::new(1), Event::default()),
            Record::dequeue(TransactionId::new(2), FileId::new(0), 0),
            Record::abort(TransactionId::new(3)),
            Record::commit(TransactionId::new(4)),
        ];

        for (i, record) in records.iter().enumerate() {
            let decoded = round_trip(record);
            assert_eq!(decoded.transaction_id(), TransactionId::new(i as u64 + 1));
        }
    }

    #[test]
    fn bad_header_is_rejected_with_observed_value() {
        let mut bytes = Record::enqueue(TransactionId::new(1), Event::default())
            .encode()
            .unwrap();
        bytes[0..4].copy_from_slice(&0u32.to_be_bytes());

        let err = Record::decode(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::BadHeader {
                observed: 0,
                expected: RECORD_MAGIC
            }
        ));
        assert_eq!(err.to_string(), "Header 0 not expected value: deadbeef");
    }

    #[test]
    fn unknown_tag_is_rejected_sign_extended() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&RECORD_MAGIC.to_be_bytes());
        bytes.extend_from_slice(&i16::MIN.to_be_bytes());
        bytes.extend_from_slice(&1u64.to_be_bytes());
        bytes.extend_from_slice(&0u64.to_be_bytes());

        let err = Record::decode(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::UnknownRecordType { action: 0xffff_8000 }
        ));
        assert_eq!(err.to_string(), "Unknown action ffff8000");
    }

    #[test]
    fn magic_is_checked_before_tag() {
        // Both the magic and the tag are wrong; the magic error wins.
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0xcafe_f00du32.to_be_bytes());
        bytes.extend_from_slice(&i16::MIN.to_be_bytes());
        bytes.extend_from_slice(&1u64.to_be_bytes());

        let err = Record::decode(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, CoreError::BadHeader { .. }));
    }

    #[test]
    fn truncated_payload_is_an_underrun() {
        let mut headers = HashMap::new();
        headers.insert("k".to_string(), "v".to_string());
        let record = Record::enqueue(
            TransactionId::new(1),
            Event::new(headers, b"body bytes".to_vec()),
        );
        let bytes = record.encode().unwrap();

        let cut = &bytes[..bytes.len() - 5];
        let err = Record::decode(&mut Cursor::new(cut.to_vec())).unwrap_err();
        assert!(err.is_truncation());
    }

    #[test]
    fn truncated_header_is_an_underrun() {
        let bytes = RECORD_MAGIC.to_be_bytes();
        let err = Record::decode(&mut Cursor::new(bytes.to_vec())).unwrap_err();
        assert!(err.is_truncation());
    }

    #[test]
    fn corrupt_body_length_fails_before_oversized_allocation() {
        // Claim a 4 GiB body with no bytes behind it.
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&RECORD_MAGIC.to_be_bytes());
        bytes.extend_from_slice(&RecordType::Enqueue.as_tag().to_be_bytes());
        bytes.extend_from_slice(&1u64.to_be_bytes());
        bytes.extend_from_slice(&0u64.to_be_bytes()); // timestamp
        bytes.extend_from_slice(&0u32.to_be_bytes()); // header count
        bytes.extend_from_slice(&u32::MAX.to_be_bytes()); // body length

        let err = Record::decode(&mut Cursor::new(bytes)).unwrap_err();
        assert!(err.is_truncation());
    }

    #[test]
    fn end_to_end_scenario() {
        let txid = TransactionId::new(77);

        let enqueue = round_trip(&Record::enqueue(txid, Event::default()));
        assert_eq!(enqueue.record_type(), RecordType::Enqueue);
        if let Record::Enqueue { event, .. } = &enqueue {
            assert!(event.headers().is_empty());
            assert!(event.body().is_empty());
        }

        let dequeue = round_trip(&Record::dequeue(txid, FileId::new(10), 20));
        if let Record::Dequeue {
            file_id, offset, ..
        } = dequeue
        {
            assert_eq!(file_id.as_u64(), 10);
            assert_eq!(offset, 20);
        } else {
            panic!("expected Dequeue");
        }

        let abort = round_trip(&Record::abort(txid));
        assert_eq!(abort.record_type(), RecordType::Abort);
        assert_eq!(abort.transaction_id(), txid);

        let commit = round_trip(&Record::commit(txid));
        assert_eq!(commit.record_type(), RecordType::Commit);
        assert_eq!(commit.transaction_id(), txid);
    }

    #[test]
    fn header_layout_is_fixed() {
        let mut record = Record::commit(TransactionId::new(0x0102_0304_0506_0708));
        record.set_timestamp(0);
        let bytes = record.encode().unwrap();

        assert_eq!(&bytes[0..4], &[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(&bytes[4..6], &[0x00, 0x04]);
        assert_eq!(
            &bytes[6..14],
            &[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]
        );
        assert_eq!(bytes.len(), HEADER_SIZE + 8);
    }
}
