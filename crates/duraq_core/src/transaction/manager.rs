//! Transaction manager.

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::event::Event;
use crate::queue::EventQueue;
use crate::transaction::state::Transaction;
use crate::types::{EventPtr, FileId, TransactionId};
use crate::wal::{Record, WalManager};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Coordinates transactions over the log and the pointer queue.
///
/// The manager provides:
/// - Transaction-ID assignment (monotonic, seeded by recovery, never reused)
/// - Eager Enqueue/Dequeue appends as operations happen
/// - Commit/Abort termination with the configured durability barrier
/// - Capacity accounting (committed events plus uncommitted puts)
///
/// Records of concurrent transactions interleave freely in the log; the
/// WAL manager guarantees each record lands as one contiguous append.
pub struct TransactionManager {
    /// Log for durability.
    wal: Arc<WalManager>,
    /// Queue of committed, not-yet-taken event pointers.
    queue: Mutex<EventQueue>,
    /// Identifier stamped into dequeue records for this log.
    file_id: FileId,
    /// Maximum events held (committed plus uncommitted puts).
    capacity: usize,
    /// Whether commit/abort sync the log to durable media.
    sync_on_commit: bool,
    /// Committed events plus uncommitted puts.
    occupancy: AtomicUsize,
    /// Next transaction ID.
    next_txid: AtomicU64,
    /// Active transactions.
    active_txns: RwLock<Vec<TransactionId>>,
}

impl TransactionManager {
    /// Creates a manager over an empty queue.
    pub fn new(wal: Arc<WalManager>, config: &Config) -> Self {
        Self::with_state(wal, config, EventQueue::new(), 1)
    }

    /// Creates a manager initialized from recovery state.
    pub fn with_state(
        wal: Arc<WalManager>,
        config: &Config,
        queue: EventQueue,
        next_txid: u64,
    ) -> Self {
        let occupancy = queue.len();
        Self {
            wal,
            queue: Mutex::new(queue),
            file_id: config.file_id,
            capacity: config.capacity,
            sync_on_commit: config.sync_on_commit,
            occupancy: AtomicUsize::new(occupancy),
            next_txid: AtomicU64::new(next_txid),
            active_txns: RwLock::new(Vec::new()),
        }
    }

    /// Begins a new transaction.
    ///
    /// Nothing is written to the log yet — a transaction exists on the
    /// wire from its first Enqueue or Dequeue record.
    pub fn begin(&self) -> Transaction {
        let txid = TransactionId::new(self.next_txid.fetch_add(1, Ordering::SeqCst));
        self.active_txns.write().push(txid);
        Transaction::new(txid)
    }

    /// Puts an event into the channel under the given transaction.
    ///
    /// The Enqueue record is appended immediately; the event becomes
    /// visible to consumers only when the transaction commits.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ChannelFull`] at capacity, or an error if the
    /// transaction is no longer active or the append fails.
    pub fn put(&self, txn: &mut Transaction, event: Event) -> CoreResult<()> {
        txn.ensure_active()?;
        self.reserve_slot()?;

        let record = Record::enqueue(txn.id(), event);
        let offset = match self.wal.append(&record) {
            Ok(offset) => offset,
            Err(e) => {
                self.release_slots(1);
                return Err(e);
            }
        };

        txn.record_put(EventPtr::new(self.file_id, offset));
        Ok(())
    }

    /// Takes the next event from the channel under the given transaction.
    ///
    /// Pops the head pointer, reads the event back from its enqueue
    /// record, and appends a Dequeue record naming the location. The
    /// removal becomes permanent only when the transaction commits; on
    /// rollback the pointer returns to the head of the queue.
    ///
    /// Returns `Ok(None)` when the channel is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction is no longer active, the
    /// pointer does not reference an enqueue record, or the append fails.
    pub fn take(&self, txn: &mut Transaction) -> CoreResult<Option<Event>> {
        txn.ensure_active()?;

        let Some(ptr) = self.queue.lock().pop_front() else {
            return Ok(None);
        };

        match self.take_inner(txn, ptr) {
            Ok(event) => Ok(Some(event)),
            Err(e) => {
                // The take never made it to the log; undo the pop.
                self.queue.lock().push_front(ptr);
                Err(e)
            }
        }
    }

    fn take_inner(&self, txn: &mut Transaction, ptr: EventPtr) -> CoreResult<Event> {
        let event = match self.wal.read_record_at(ptr.offset)? {
            Record::Enqueue { event, .. } => event,
            other => {
                return Err(CoreError::log_corruption(format!(
                    "queue pointer {ptr} references a {:?} record",
                    other.record_type()
                )));
            }
        };

        self.wal
            .append(&Record::dequeue(txn.id(), ptr.file_id, ptr.offset))?;
        txn.record_take(ptr);
        Ok(event)
    }

    /// Commits a transaction.
    ///
    /// Appends the Commit record and applies the configured durability
    /// barrier before the transaction's puts become visible. After this
    /// returns, the transaction's effects survive a crash.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction is not active or the log write
    /// fails.
    pub fn commit(&self, txn: &mut Transaction) -> CoreResult<()> {
        txn.ensure_active()?;

        self.wal.append(&Record::commit(txn.id()))?;
        self.barrier()?;

        // Publish puts; takes are now permanent.
        let mut queue = self.queue.lock();
        for ptr in txn.puts() {
            queue.push_back(*ptr);
        }
        drop(queue);

        self.release_slots(txn.take_count());
        self.retire(txn.id());
        txn.mark_committed();

        tracing::debug!(
            txid = %txn.id(),
            puts = txn.put_count(),
            takes = txn.take_count(),
            "transaction committed"
        );
        Ok(())
    }

    /// Rolls back a transaction.
    ///
    /// Appends the Abort record, discards the transaction's puts, and
    /// returns its taken pointers to the head of the queue in their
    /// original order.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction is not active or the log write
    /// fails.
    pub fn rollback(&self, txn: &mut Transaction) -> CoreResult<()> {
        txn.ensure_active()?;

        self.wal.append(&Record::abort(txn.id()))?;
        self.barrier()?;

        // Earliest take goes back first, ending up at the very head.
        let mut queue = self.queue.lock();
        for ptr in txn.takes().iter().rev() {
            queue.push_front(*ptr);
        }
        drop(queue);

        self.release_slots(txn.put_count());
        self.retire(txn.id());
        txn.mark_aborted();

        tracing::debug!(txid = %txn.id(), "transaction rolled back");
        Ok(())
    }

    /// Returns the number of committed events awaiting take.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.queue.lock().len()
    }

    /// Returns the configured capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of active transactions.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active_txns.read().len()
    }

    /// Discards the log if it no longer encodes anything.
    ///
    /// Sound only when the queue is empty and no transactions are active:
    /// in that state every transaction in the log is terminated and every
    /// committed enqueue has a committed dequeue. Returns whether the log
    /// was truncated.
    ///
    /// # Errors
    ///
    /// Returns an error if the truncation fails.
    pub fn compact(&self) -> CoreResult<bool> {
        // Hold the queue lock across the check and the truncation so no
        // take can slip a pointer back in between.
        let queue = self.queue.lock();
        if !queue.is_empty() || self.active_count() > 0 {
            return Ok(false);
        }

        self.wal.clear()?;
        tracing::info!("log compacted");
        Ok(true)
    }

    fn barrier(&self) -> CoreResult<()> {
        if self.sync_on_commit {
            self.wal.sync()
        } else {
            self.wal.flush()
        }
    }

    fn reserve_slot(&self) -> CoreResult<()> {
        let previous = self.occupancy.fetch_add(1, Ordering::SeqCst);
        if previous >= self.capacity {
            self.occupancy.fetch_sub(1, Ordering::SeqCst);
            return Err(CoreError::ChannelFull {
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    fn release_slots(&self, n: usize) {
        self.occupancy.fetch_sub(n, Ordering::SeqCst);
    }

    fn retire(&self, txid: TransactionId) {
        self.active_txns.write().retain(|&id| id != txid);
    }
}

impl std::fmt::Debug for TransactionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionManager")
            .field("depth", &self.depth())
            .field("capacity", &self.capacity)
            .field("active_count", &self.active_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duraq_storage::InMemoryBackend;

    fn create_manager() -> TransactionManager {
        create_manager_with(Config::default().sync_on_commit(false))
    }

    fn create_manager_with(config: Config) -> TransactionManager {
        let wal = Arc::new(WalManager::new(Box::new(InMemoryBackend::new())));
        TransactionManager::new(wal, &config)
    }

    fn event(body: &[u8]) -> Event {
        Event::from_body(body.to_vec())
    }

    #[test]
    fn begin_assigns_monotonic_ids() {
        let tm = create_manager();
        let t1 = tm.begin();
        let t2 = tm.begin();
        assert!(t2.id() > t1.id());
        assert_eq!(tm.active_count(), 2);
    }

    #[test]
    fn put_is_invisible_until_commit() {
        let tm = create_manager();

        let mut producer = tm.begin();
        tm.put(&mut producer, event(b"pending")).unwrap();
        assert_eq!(tm.depth(), 0);

        tm.commit(&mut producer).unwrap();
        assert_eq!(tm.depth(), 1);
    }

    #[test]
    fn put_take_round_trip() {
        let tm = create_manager();

        let mut producer = tm.begin();
        tm.put(&mut producer, event(b"payload")).unwrap();
        tm.commit(&mut producer).unwrap();

        let mut consumer = tm.begin();
        let taken = tm.take(&mut consumer).unwrap().unwrap();
        assert_eq!(taken.body(), b"payload");
        tm.commit(&mut consumer).unwrap();

        assert_eq!(tm.depth(), 0);
        assert_eq!(tm.active_count(), 0);
    }

    #[test]
    fn take_from_empty_channel() {
        let tm = create_manager();
        let mut txn = tm.begin();
        assert!(tm.take(&mut txn).unwrap().is_none());
        tm.commit(&mut txn).unwrap();
    }

    #[test]
    fn rollback_discards_puts() {
        let tm = create_manager();

        let mut producer = tm.begin();
        tm.put(&mut producer, event(b"doomed")).unwrap();
        tm.rollback(&mut producer).unwrap();

        assert_eq!(tm.depth(), 0);
        let mut consumer = tm.begin();
        assert!(tm.take(&mut consumer).unwrap().is_none());
    }

    #[test]
    fn rollback_returns_takes_to_head_in_order() {
        let tm = create_manager();

        let mut producer = tm.begin();
        tm.put(&mut producer, event(b"one")).unwrap();
        tm.put(&mut producer, event(b"two")).unwrap();
        tm.commit(&mut producer).unwrap();

        let mut consumer = tm.begin();
        assert_eq!(tm.take(&mut consumer).unwrap().unwrap().body(), b"one");
        assert_eq!(tm.take(&mut consumer).unwrap().unwrap().body(), b"two");
        tm.rollback(&mut consumer).unwrap();

        // Order is restored for the next consumer.
        let mut retry = tm.begin();
        assert_eq!(tm.take(&mut retry).unwrap().unwrap().body(), b"one");
        assert_eq!(tm.take(&mut retry).unwrap().unwrap().body(), b"two");
        tm.commit(&mut retry).unwrap();
    }

    #[test]
    fn committed_takes_are_permanent() {
        let tm = create_manager();

        let mut producer = tm.begin();
        tm.put(&mut producer, event(b"gone")).unwrap();
        tm.commit(&mut producer).unwrap();

        let mut consumer = tm.begin();
        tm.take(&mut consumer).unwrap().unwrap();
        tm.commit(&mut consumer).unwrap();

        let mut late = tm.begin();
        assert!(tm.take(&mut late).unwrap().is_none());
    }

    #[test]
    fn cannot_commit_twice() {
        let tm = create_manager();
        let mut txn = tm.begin();
        tm.commit(&mut txn).unwrap();
        assert!(tm.commit(&mut txn).is_err());
    }

    #[test]
    fn cannot_rollback_after_commit() {
        let tm = create_manager();
        let mut txn = tm.begin();
        tm.commit(&mut txn).unwrap();
        assert!(tm.rollback(&mut txn).is_err());
    }

    #[test]
    fn capacity_counts_uncommitted_puts() {
        let tm = create_manager_with(
            Config::default().capacity(2).sync_on_commit(false),
        );

        let mut txn = tm.begin();
        tm.put(&mut txn, event(b"1")).unwrap();
        tm.put(&mut txn, event(b"2")).unwrap();

        let result = tm.put(&mut txn, event(b"3"));
        assert!(matches!(result, Err(CoreError::ChannelFull { capacity: 2 })));

        // Rolling back releases the reserved slots.
        tm.rollback(&mut txn).unwrap();
        let mut retry = tm.begin();
        tm.put(&mut retry, event(b"4")).unwrap();
        tm.commit(&mut retry).unwrap();
        assert_eq!(tm.depth(), 1);
    }

    #[test]
    fn capacity_frees_after_committed_take() {
        let tm = create_manager_with(
            Config::default().capacity(1).sync_on_commit(false),
        );

        let mut producer = tm.begin();
        tm.put(&mut producer, event(b"only")).unwrap();
        tm.commit(&mut producer).unwrap();

        let mut blocked = tm.begin();
        assert!(tm.put(&mut blocked, event(b"nope")).is_err());
        tm.rollback(&mut blocked).unwrap();

        let mut consumer = tm.begin();
        tm.take(&mut consumer).unwrap().unwrap();
        tm.commit(&mut consumer).unwrap();

        let mut producer = tm.begin();
        tm.put(&mut producer, event(b"fits now")).unwrap();
        tm.commit(&mut producer).unwrap();
    }

    #[test]
    fn interleaved_transactions() {
        let tm = create_manager();

        let mut a = tm.begin();
        let mut b = tm.begin();
        tm.put(&mut a, event(b"from-a")).unwrap();
        tm.put(&mut b, event(b"from-b")).unwrap();
        tm.rollback(&mut b).unwrap();
        tm.commit(&mut a).unwrap();

        let mut consumer = tm.begin();
        assert_eq!(tm.take(&mut consumer).unwrap().unwrap().body(), b"from-a");
        assert!(tm.take(&mut consumer).unwrap().is_none());
        tm.commit(&mut consumer).unwrap();
    }

    #[test]
    fn compact_only_when_idle_and_empty() {
        let tm = create_manager();

        let mut producer = tm.begin();
        tm.put(&mut producer, event(b"x")).unwrap();
        assert!(!tm.compact().unwrap()); // active transaction
        tm.commit(&mut producer).unwrap();
        assert!(!tm.compact().unwrap()); // queued event

        let mut consumer = tm.begin();
        tm.take(&mut consumer).unwrap().unwrap();
        tm.commit(&mut consumer).unwrap();

        assert!(tm.compact().unwrap());
    }
}
