//! Channel configuration.

use crate::types::FileId;

/// Configuration for opening a channel.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether to create the channel directory if it doesn't exist.
    pub create_if_missing: bool,

    /// Maximum number of events the channel may hold, counting committed
    /// events plus uncommitted puts.
    pub capacity: usize,

    /// Whether to sync the log to durable media on every commit and abort
    /// (safer but slower).
    pub sync_on_commit: bool,

    /// Identifier stamped into dequeue records for this log file.
    pub file_id: FileId,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            capacity: 1_000_000,
            sync_on_commit: true,
            file_id: FileId::new(0),
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create the channel directory if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets the channel capacity.
    #[must_use]
    pub const fn capacity(mut self, value: usize) -> Self {
        self.capacity = value;
        self
    }

    /// Sets whether to sync the log on every commit.
    #[must_use]
    pub const fn sync_on_commit(mut self, value: bool) -> Self {
        self.sync_on_commit = value;
        self
    }

    /// Sets the file ID stamped into dequeue records.
    #[must_use]
    pub const fn file_id(mut self, value: FileId) -> Self {
        self.file_id = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(config.create_if_missing);
        assert!(config.sync_on_commit);
        assert_eq!(config.capacity, 1_000_000);
        assert_eq!(config.file_id, FileId::new(0));
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new()
            .create_if_missing(false)
            .capacity(16)
            .sync_on_commit(false)
            .file_id(FileId::new(7));

        assert!(!config.create_if_missing);
        assert!(!config.sync_on_commit);
        assert_eq!(config.capacity, 16);
        assert_eq!(config.file_id, FileId::new(7));
    }
}
