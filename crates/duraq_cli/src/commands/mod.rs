//! CLI command implementations.

pub mod dump_log;
pub mod inspect;
pub mod verify;

use duraq_core::wal::WalManager;
use duraq_storage::FileBackend;
use std::path::Path;

/// Name of the log file within a channel directory.
const LOG_FILE: &str = "log.dat";

/// Opens the channel's log for read-oriented tooling.
///
/// Does not take the channel lock: these tools only read.
pub(crate) fn open_log(path: &Path) -> Result<WalManager, Box<dyn std::error::Error>> {
    let log_path = path.join(LOG_FILE);
    if !log_path.exists() {
        return Err(format!("no log file at {}", log_path.display()).into());
    }
    let backend = FileBackend::open(&log_path)?;
    Ok(WalManager::new(Box::new(backend)))
}
