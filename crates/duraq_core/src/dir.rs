//! Channel directory management.
//!
//! A channel lives in a directory with this layout:
//!
//! ```text
//! <channel_path>/
//! ├─ LOCK       # Advisory lock for single-process access
//! └─ log.dat    # Write-ahead log
//! ```
//!
//! The LOCK file ensures only one process operates on the channel at a
//! time; the log is the single source of truth for its contents.

use crate::error::{CoreError, CoreResult};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

const LOCK_FILE: &str = "LOCK";
const LOG_FILE: &str = "log.dat";

/// Manages the channel directory and its advisory lock.
///
/// Only one `ChannelDir` instance can exist per directory at a time; the
/// lock is released when the instance is dropped.
#[derive(Debug)]
pub struct ChannelDir {
    /// Root directory path.
    path: PathBuf,
    /// Lock file handle (held for exclusive access).
    _lock_file: File,
}

impl ChannelDir {
    /// Opens or creates a channel directory.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory doesn't exist and `create_if_missing` is false
    /// - Another process holds the lock (returns `ChannelLocked`)
    /// - I/O errors occur
    pub fn open(path: &Path, create_if_missing: bool) -> CoreResult<Self> {
        if !path.exists() {
            if create_if_missing {
                fs::create_dir_all(path)?;
            } else {
                return Err(CoreError::invalid_directory(format!(
                    "channel directory does not exist: {}",
                    path.display()
                )));
            }
        }

        if !path.is_dir() {
            return Err(CoreError::invalid_directory(format!(
                "path is not a directory: {}",
                path.display()
            )));
        }

        let lock_path = path.join(LOCK_FILE);
        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(CoreError::ChannelLocked);
        }

        Ok(Self {
            path: path.to_path_buf(),
            _lock_file: lock_file,
        })
    }

    /// Returns the path to the channel directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the path to the log file.
    #[must_use]
    pub fn log_path(&self) -> PathBuf {
        self.path.join(LOG_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn open_creates_directory() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("channel");
        assert!(!path.exists());

        let dir = ChannelDir::open(&path, true).unwrap();
        assert!(path.is_dir());
        assert_eq!(dir.log_path(), path.join("log.dat"));
    }

    #[test]
    fn open_fails_without_create() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("missing");

        let result = ChannelDir::open(&path, false);
        assert!(matches!(result, Err(CoreError::InvalidDirectory { .. })));
    }

    #[test]
    fn lock_prevents_second_open() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("channel");

        let _dir = ChannelDir::open(&path, true).unwrap();
        let result = ChannelDir::open(&path, true);
        assert!(matches!(result, Err(CoreError::ChannelLocked)));
    }

    #[test]
    fn lock_released_on_drop() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("channel");

        {
            let _dir = ChannelDir::open(&path, true).unwrap();
        }

        let _dir = ChannelDir::open(&path, true).unwrap();
    }
}
