//! # duraq Core
//!
//! Core engine for duraq: a durable, transactional, file-backed event
//! queue.
//!
//! Producers append events to a channel and consumers remove them; both
//! operations run inside transactions that survive process crashes. Every
//! mutation is first recorded in an append-only write-ahead log as a
//! self-describing binary record; opening a channel replays the log to
//! reconstruct exactly the set of events that were durably committed.
//!
//! This crate provides:
//! - The WAL record codec (the on-disk format) — see [`wal`]
//! - The log writer and streaming record iterator
//! - Replay-based crash recovery
//! - The in-memory pointer queue
//! - The transaction layer and the [`Channel`] API
//!
//! ## Example
//!
//! ```no_run
//! use duraq_core::{Channel, Config, Event};
//! use std::path::Path;
//!
//! let channel = Channel::open(Path::new("my_channel"), Config::default())?;
//!
//! let mut txn = channel.begin();
//! channel.put(&mut txn, Event::from_body(b"hello".to_vec()))?;
//! channel.commit(&mut txn)?;
//! # Ok::<(), duraq_core::CoreError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod channel;
mod config;
mod dir;
mod error;
mod event;
mod queue;
mod recovery;
mod transaction;
mod types;
pub mod wal;

pub use channel::Channel;
pub use config::Config;
pub use dir::ChannelDir;
pub use error::{CoreError, CoreResult};
pub use event::Event;
pub use queue::EventQueue;
pub use recovery::{replay, Replay, ReplayStats};
pub use transaction::{Transaction, TransactionManager, TransactionState};
pub use types::{now_millis, EventPtr, FileId, TransactionId};

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
