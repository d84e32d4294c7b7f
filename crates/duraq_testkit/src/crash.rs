//! Crash-simulation helpers for recovery testing.
//!
//! A channel's log is a plain byte sequence, so crash scenarios can be
//! simulated by building a log image, mangling it the way a crash or
//! bit rot would, and opening a channel over the result with
//! [`duraq_storage::InMemoryBackend::with_data`].

use duraq_core::wal::Record;
use duraq_core::{Channel, Config, CoreResult};
use duraq_storage::InMemoryBackend;

/// Encodes records back-to-back into a log image.
#[must_use]
pub fn log_image(records: &[Record]) -> Vec<u8> {
    let mut image = Vec::new();
    for record in records {
        image.extend_from_slice(&record.encode().expect("record should encode"));
    }
    image
}

/// Cuts `n` bytes off the tail, as a crash mid-append would.
#[must_use]
pub fn cut_tail(mut image: Vec<u8>, n: usize) -> Vec<u8> {
    let keep = image.len().saturating_sub(n);
    image.truncate(keep);
    image
}

/// Overwrites the magic marker of the record starting at `offset`.
pub fn corrupt_magic_at(image: &mut [u8], offset: usize) {
    image[offset..offset + 4].copy_from_slice(&0u32.to_be_bytes());
}

/// Overwrites the type tag of the record starting at `offset` with the
/// minimum representable tag.
pub fn corrupt_tag_at(image: &mut [u8], offset: usize) {
    image[offset + 4..offset + 6].copy_from_slice(&i16::MIN.to_be_bytes());
}

/// Opens a channel over a raw log image, running full recovery.
///
/// # Errors
///
/// Returns whatever recovery returns — corruption errors propagate.
pub fn channel_from_image(image: Vec<u8>) -> CoreResult<Channel> {
    Channel::with_backend(
        Box::new(InMemoryBackend::with_data(image)),
        Config::default().sync_on_commit(false),
    )
}

/// Returns the encoded length of a record.
#[must_use]
pub fn record_len(record: &Record) -> usize {
    record.encode().expect("record should encode").len()
}
