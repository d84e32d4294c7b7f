//! Write-Ahead Log (WAL) for durability and crash recovery.
//!
//! Every mutation of the channel — enqueue, dequeue, transaction abort,
//! transaction commit — is appended to the log as a self-describing binary
//! record before it is acknowledged. On open, the log is replayed to
//! reconstruct exactly the committed queue state.
//!
//! ## Record Format
//!
//! All integers are fixed-width big-endian.
//!
//! ```text
//! record            | magic (4) | type tag (2, signed) | transaction id (8) | payload |
//! payload (Enqueue) | timestamp (8) | header count (4)
//!                   | { key len (4) | key | value len (4) | value }*
//!                   | body len (4) | body |
//! payload (Dequeue) | timestamp (8) | file id (8) | offset (8) |
//! payload (Abort)   | timestamp (8) |
//! payload (Commit)  | timestamp (8) |
//! ```
//!
//! There is no length prefix and no trailing checksum: a record's extent is
//! discovered by decoding it, which is why the header is validated in a
//! strict order (magic, then tag, then payload) — each check yields the
//! most specific diagnostic for the earliest point of divergence.
//!
//! ## Recovery Policy
//!
//! The iterator distinguishes **tolerated** from **fatal** conditions:
//!
//! ### Tolerated (treated as clean end-of-log)
//!
//! - **Truncated record at the tail**: decoding ran out of bytes. The
//!   process crashed mid-append before the record was complete; the
//!   partial record is discarded and replay ends at its start offset.
//!
//! ### Fatal (replay aborts with an error)
//!
//! - **Bad magic**: the leading 4 bytes are not `0xdeadbeef` — the reader
//!   is misaligned or the file is damaged ([`crate::CoreError::BadHeader`]).
//! - **Unknown type tag**: a tag outside the four reserved values — a
//!   record from an unsupported format version
//!   ([`crate::CoreError::UnknownRecordType`]).
//!
//! ## Invariants
//!
//! - The log is **append-only**; records are never rewritten in place
//! - A transaction's records interleave freely with other transactions';
//!   its boundary is defined by its Abort/Commit record, not by position
//! - A transaction with no terminating record by end-of-log is in-flight
//!   and its effects are not applied

mod iterator;
mod record;
mod writer;

pub use iterator::LogIterator;
pub use record::{Record, RecordType, HEADER_SIZE, RECORD_MAGIC};
pub use writer::WalManager;
