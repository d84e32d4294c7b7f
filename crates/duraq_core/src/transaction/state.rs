//! Transaction state.

use crate::error::{CoreError, CoreResult};
use crate::types::{EventPtr, TransactionId};

/// State of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Transaction is active and can perform operations.
    Active,
    /// Transaction has been committed.
    Committed,
    /// Transaction has been rolled back.
    Aborted,
}

/// An active transaction over the channel.
///
/// Tracks the log pointers of the events this transaction has put (not yet
/// visible to consumers) and taken (not yet permanently removed). The
/// terminating commit or rollback resolves both sets.
#[derive(Debug)]
pub struct Transaction {
    /// Transaction ID.
    id: TransactionId,
    /// Current state.
    state: TransactionState,
    /// Pointers to enqueue records written by this transaction.
    puts: Vec<EventPtr>,
    /// Pointers removed from the queue by this transaction.
    takes: Vec<EventPtr>,
}

impl Transaction {
    /// Creates a new active transaction.
    pub(crate) fn new(id: TransactionId) -> Self {
        Self {
            id,
            state: TransactionState::Active,
            puts: Vec::new(),
            takes: Vec::new(),
        }
    }

    /// Returns the transaction ID.
    #[must_use]
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Checks if the transaction is still active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == TransactionState::Active
    }

    /// Returns the number of uncommitted puts.
    #[must_use]
    pub fn put_count(&self) -> usize {
        self.puts.len()
    }

    /// Returns the number of uncommitted takes.
    #[must_use]
    pub fn take_count(&self) -> usize {
        self.takes.len()
    }

    /// Pointers enqueued by this transaction, in put order.
    pub(crate) fn puts(&self) -> &[EventPtr] {
        &self.puts
    }

    /// Pointers taken by this transaction, in take order.
    pub(crate) fn takes(&self) -> &[EventPtr] {
        &self.takes
    }

    /// Records a put.
    pub(crate) fn record_put(&mut self, ptr: EventPtr) {
        self.puts.push(ptr);
    }

    /// Records a take.
    pub(crate) fn record_take(&mut self, ptr: EventPtr) {
        self.takes.push(ptr);
    }

    /// Marks the transaction as committed.
    pub(crate) fn mark_committed(&mut self) {
        self.state = TransactionState::Committed;
    }

    /// Marks the transaction as aborted.
    pub(crate) fn mark_aborted(&mut self) {
        self.state = TransactionState::Aborted;
    }

    /// Ensures the transaction is active.
    pub(crate) fn ensure_active(&self) -> CoreResult<()> {
        match self.state {
            TransactionState::Active => Ok(()),
            TransactionState::Committed => Err(CoreError::invalid_operation(
                "transaction already committed",
            )),
            TransactionState::Aborted => {
                Err(CoreError::invalid_operation("transaction already aborted"))
            }
        }
    }
}
