//! # duraq Testkit
//!
//! Test utilities for duraq.
//!
//! This crate provides:
//! - Channel fixtures (in-memory and temp-directory)
//! - Property-based generators using proptest
//! - Crash-simulation helpers for recovery testing
//!
//! ## Usage
//!
//! ```rust
//! use duraq_testkit::prelude::*;
//! use duraq_core::Event;
//!
//! let channel = memory_channel();
//! let mut txn = channel.begin();
//! channel.put(&mut txn, Event::from_body(b"x".to_vec())).unwrap();
//! channel.commit(&mut txn).unwrap();
//! assert_eq!(channel.depth(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod crash;
pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::crash::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use crash::*;
pub use fixtures::*;
pub use generators::*;
