//! The channel: a durable, transactional event queue.

use crate::config::Config;
use crate::dir::ChannelDir;
use crate::error::CoreResult;
use crate::event::Event;
use crate::queue::EventQueue;
use crate::recovery;
use crate::transaction::{Transaction, TransactionManager};
use duraq_storage::{FileBackend, StorageBackend};
use std::path::Path;
use std::sync::Arc;

/// A durable, transactional event queue backed by a write-ahead log.
///
/// Producers `put` events and consumers `take` them; both run inside
/// transactions, and nothing is acknowledged until its record is in the
/// log. Opening a channel replays the log, so a crash at any point leaves
/// exactly the committed events in the queue.
///
/// # Example
///
/// ```no_run
/// use duraq_core::{Channel, Config, Event};
/// use std::path::Path;
///
/// let channel = Channel::open(Path::new("my_channel"), Config::default())?;
///
/// let mut txn = channel.begin();
/// channel.put(&mut txn, Event::from_body(b"a log line".to_vec()))?;
/// channel.commit(&mut txn)?;
///
/// let mut txn = channel.begin();
/// if let Some(event) = channel.take(&mut txn)? {
///     // process the event...
/// }
/// channel.commit(&mut txn)?;
/// # Ok::<(), duraq_core::CoreError>(())
/// ```
pub struct Channel {
    manager: TransactionManager,
    wal: Arc<crate::wal::WalManager>,
    _dir: Option<ChannelDir>,
}

impl Channel {
    /// Opens or creates a channel at the given directory.
    ///
    /// Takes an exclusive lock on the directory, opens the log, and
    /// replays it to reconstruct the committed queue state.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be locked, the log cannot
    /// be opened, or replay finds corruption.
    pub fn open(path: &Path, config: Config) -> CoreResult<Self> {
        let dir = ChannelDir::open(path, config.create_if_missing)?;
        let backend = FileBackend::open(&dir.log_path())?;
        tracing::info!(path = %path.display(), "opening channel");
        Self::build(Box::new(backend), config, Some(dir))
    }

    /// Opens a channel over an arbitrary backend.
    ///
    /// No directory or lock is involved; the backend's existing contents
    /// are replayed. Used for in-memory channels and recovery tests.
    ///
    /// # Errors
    ///
    /// Returns an error if replay finds corruption.
    pub fn with_backend(backend: Box<dyn StorageBackend>, config: Config) -> CoreResult<Self> {
        Self::build(backend, config, None)
    }

    fn build(
        backend: Box<dyn StorageBackend>,
        config: Config,
        dir: Option<ChannelDir>,
    ) -> CoreResult<Self> {
        let wal = Arc::new(crate::wal::WalManager::new(backend));
        let replay = recovery::replay(&wal, config.file_id)?;

        // A crash mid-append leaves a torn record past the valid prefix.
        // It must go before anything else is written, or the next record
        // would land behind unreadable bytes.
        let size = wal.size()?;
        if replay.log_end < size {
            tracing::warn!(
                torn_bytes = size - replay.log_end,
                "truncating incomplete record at log tail"
            );
            wal.truncate(replay.log_end)?;
        }

        let manager = TransactionManager::with_state(
            Arc::clone(&wal),
            &config,
            EventQueue::from_ptrs(replay.queue),
            replay.next_txid,
        );
        Ok(Self {
            manager,
            wal,
            _dir: dir,
        })
    }

    /// Begins a new transaction.
    #[must_use]
    pub fn begin(&self) -> Transaction {
        self.manager.begin()
    }

    /// Puts an event into the channel under the given transaction.
    ///
    /// # Errors
    ///
    /// See [`TransactionManager::put`].
    pub fn put(&self, txn: &mut Transaction, event: Event) -> CoreResult<()> {
        self.manager.put(txn, event)
    }

    /// Takes the next event from the channel under the given transaction.
    ///
    /// Returns `Ok(None)` when the channel is empty.
    ///
    /// # Errors
    ///
    /// See [`TransactionManager::take`].
    pub fn take(&self, txn: &mut Transaction) -> CoreResult<Option<Event>> {
        self.manager.take(txn)
    }

    /// Commits a transaction, making its effects durable.
    ///
    /// # Errors
    ///
    /// See [`TransactionManager::commit`].
    pub fn commit(&self, txn: &mut Transaction) -> CoreResult<()> {
        self.manager.commit(txn)
    }

    /// Rolls back a transaction, discarding its effects.
    ///
    /// # Errors
    ///
    /// See [`TransactionManager::rollback`].
    pub fn rollback(&self, txn: &mut Transaction) -> CoreResult<()> {
        self.manager.rollback(txn)
    }

    /// Returns the number of committed events awaiting take.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.manager.depth()
    }

    /// Returns the configured capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.manager.capacity()
    }

    /// Returns the number of active transactions.
    #[must_use]
    pub fn active_transactions(&self) -> usize {
        self.manager.active_count()
    }

    /// Returns the current log size in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot report its size.
    pub fn log_size(&self) -> CoreResult<u64> {
        self.wal.size()
    }

    /// Discards the log if the channel is empty and idle.
    ///
    /// Returns whether the log was truncated.
    ///
    /// # Errors
    ///
    /// Returns an error if the truncation fails.
    pub fn compact(&self) -> CoreResult<bool> {
        self.manager.compact()
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("depth", &self.depth())
            .field("capacity", &self.capacity())
            .finish_non_exhaustive()
    }
}
