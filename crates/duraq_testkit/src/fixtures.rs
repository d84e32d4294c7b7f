//! Channel fixtures.

use duraq_core::{Channel, Config, Event, FileId};
use duraq_storage::InMemoryBackend;
use std::collections::HashMap;
use tempfile::TempDir;

/// Creates an in-memory channel with syncing disabled.
#[must_use]
pub fn memory_channel() -> Channel {
    memory_channel_with(Config::default().sync_on_commit(false))
}

/// Creates an in-memory channel with the given configuration.
#[must_use]
pub fn memory_channel_with(config: Config) -> Channel {
    Channel::with_backend(Box::new(InMemoryBackend::new()), config)
        .expect("in-memory channel should open")
}

/// Creates an on-disk channel in a fresh temp directory.
///
/// The directory is removed when the returned `TempDir` is dropped, so
/// keep it alive for the duration of the test.
#[must_use]
pub fn temp_channel() -> (TempDir, Channel) {
    let dir = TempDir::new().expect("temp dir");
    let channel = Channel::open(&dir.path().join("channel"), Config::default())
        .expect("temp channel should open");
    (dir, channel)
}

/// Runs a test body against a fresh temp-directory channel.
pub fn with_temp_channel<F>(f: F)
where
    F: FnOnce(&Channel),
{
    let (_dir, channel) = temp_channel();
    f(&channel);
}

/// Builds a distinguishable sample event.
#[must_use]
pub fn sample_event(n: usize) -> Event {
    let mut headers = HashMap::new();
    headers.insert("seq".to_string(), n.to_string());
    Event::new(headers, format!("event-{n}").into_bytes())
}

/// Puts and commits `n` sample events, one transaction each.
pub fn fill(channel: &Channel, n: usize) {
    for i in 0..n {
        let mut txn = channel.begin();
        channel.put(&mut txn, sample_event(i)).expect("put");
        channel.commit(&mut txn).expect("commit");
    }
}

/// Returns the file ID fixtures stamp into logs.
#[must_use]
pub fn fixture_file_id() -> FileId {
    FileId::new(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_channel_starts_empty() {
        let channel = memory_channel();
        assert_eq!(channel.depth(), 0);
        assert_eq!(channel.active_transactions(), 0);
    }

    #[test]
    fn fill_commits_in_order() {
        let channel = memory_channel();
        fill(&channel, 3);
        assert_eq!(channel.depth(), 3);

        let mut txn = channel.begin();
        for i in 0..3 {
            let event = channel.take(&mut txn).unwrap().unwrap();
            assert_eq!(event.body(), format!("event-{i}").as_bytes());
            assert_eq!(event.headers().get("seq"), Some(&i.to_string()));
        }
        channel.commit(&mut txn).unwrap();
    }

    #[test]
    fn with_temp_channel_runs_body() {
        with_temp_channel(|channel| {
            fill(channel, 1);
            assert_eq!(channel.depth(), 1);
        });
    }
}
