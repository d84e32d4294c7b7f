//! Replay-based crash recovery.
//!
//! Recovery reads an arbitrary prefix of the log — including one truncated
//! mid-record by a crash — and reconstructs exactly the set of events that
//! were durably committed:
//!
//! 1. **Outcome pass**: scan the log once, collecting the outcome
//!    (committed / aborted / in-flight) of every transaction and the
//!    highest transaction ID seen.
//! 2. **Apply pass**: scan again, in log order inserting the pointer of
//!    every Enqueue belonging to a committed transaction and removing the
//!    pointer named by every Dequeue belonging to a committed transaction.
//!
//! Transactions with no terminating Abort/Commit by end-of-log were in
//! flight at the crash; their effects are discarded.

use crate::error::CoreResult;
use crate::types::{EventPtr, FileId, TransactionId};
use crate::wal::{Record, WalManager};
use std::collections::HashSet;

/// Counters describing what a replay saw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Total records decoded.
    pub records: usize,
    /// Transactions that committed.
    pub committed: usize,
    /// Transactions that aborted.
    pub aborted: usize,
    /// Transactions still open at end-of-log (discarded).
    pub in_flight: usize,
}

/// The reconstructed state of a channel after replay.
#[derive(Debug)]
pub struct Replay {
    /// Pointers to committed, not-yet-taken events, in log order.
    pub queue: Vec<EventPtr>,
    /// The next transaction ID to assign.
    pub next_txid: u64,
    /// End offset of the last complete record.
    ///
    /// Anything past this is a torn append from a crash and must be
    /// truncated before the log is written to again.
    pub log_end: u64,
    /// Replay counters.
    pub stats: ReplayStats,
}

/// Replays the log, reconstructing the committed queue state.
///
/// `file_id` is the identifier of the log being replayed; Enqueue records
/// found in it produce pointers under that ID, and Dequeue records remove
/// whatever pointer they name.
///
/// # Errors
///
/// Returns an error if the log is corrupt (bad magic) or contains a record
/// of an unknown type. A truncated record at the tail is not an error —
/// the scan ends cleanly before it.
pub fn replay(wal: &WalManager, file_id: FileId) -> CoreResult<Replay> {
    let mut committed: HashSet<TransactionId> = HashSet::new();
    let mut aborted: HashSet<TransactionId> = HashSet::new();
    let mut seen: HashSet<TransactionId> = HashSet::new();
    let mut max_txid = 0u64;
    let mut records = 0usize;

    let mut iter = wal.iter()?;
    for result in iter.by_ref() {
        let (_, record) = result?;
        records += 1;

        let txid = record.transaction_id();
        seen.insert(txid);
        max_txid = max_txid.max(txid.as_u64());

        match record {
            Record::Commit { txid, .. } => {
                committed.insert(txid);
            }
            Record::Abort { txid, .. } => {
                aborted.insert(txid);
            }
            _ => {}
        }
    }
    let log_end = iter.valid_end();
    drop(iter);

    let mut enqueued: Vec<EventPtr> = Vec::new();
    let mut removed: HashSet<EventPtr> = HashSet::new();

    for result in wal.iter()? {
        let (offset, record) = result?;
        match record {
            Record::Enqueue { txid, .. } if committed.contains(&txid) => {
                enqueued.push(EventPtr::new(file_id, offset));
            }
            Record::Dequeue {
                txid,
                file_id: src,
                offset: src_offset,
                ..
            } if committed.contains(&txid) => {
                removed.insert(EventPtr::new(src, src_offset));
            }
            _ => {}
        }
    }

    let queue: Vec<EventPtr> = enqueued
        .into_iter()
        .filter(|ptr| !removed.contains(ptr))
        .collect();

    let in_flight = seen.len() - committed.len() - aborted.len();
    let stats = ReplayStats {
        records,
        committed: committed.len(),
        aborted: aborted.len(),
        in_flight,
    };

    if in_flight > 0 {
        tracing::warn!(
            in_flight,
            "discarding transactions with no terminating record"
        );
    }
    tracing::info!(
        records,
        events = queue.len(),
        committed = stats.committed,
        aborted = stats.aborted,
        "log replay complete"
    );

    Ok(Replay {
        queue,
        next_txid: max_txid + 1,
        log_end,
        stats,
    })
}
