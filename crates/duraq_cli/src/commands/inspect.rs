//! Inspect command implementation.

use duraq_core::{replay, FileId};
use serde::Serialize;
use std::path::Path;

/// Channel inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Channel path.
    pub path: String,
    /// Log file size in bytes.
    pub log_size: u64,
    /// Number of records in the log.
    pub records: usize,
    /// Transactions that committed.
    pub committed_txns: usize,
    /// Transactions that aborted.
    pub aborted_txns: usize,
    /// Transactions with no terminating record.
    pub in_flight_txns: usize,
    /// Events in the queue after replay.
    pub queue_depth: usize,
    /// Next transaction ID recovery would assign.
    pub next_transaction_id: u64,
    /// Bytes of incomplete record at the log tail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub torn_tail_bytes: Option<u64>,
}

/// Runs the inspect command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let wal = super::open_log(path)?;
    let size = wal.size()?;
    let replay = replay(&wal, FileId::new(0))?;
    let torn_bytes = size - replay.log_end;

    let result = InspectResult {
        path: path.display().to_string(),
        log_size: size,
        records: replay.stats.records,
        committed_txns: replay.stats.committed,
        aborted_txns: replay.stats.aborted,
        in_flight_txns: replay.stats.in_flight,
        queue_depth: replay.queue.len(),
        next_transaction_id: replay.next_txid,
        torn_tail_bytes: (torn_bytes > 0).then_some(torn_bytes),
    };

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

fn print_text_output(result: &InspectResult) {
    println!("Channel at {}", result.path);
    println!();
    println!("  Log size:        {} bytes", result.log_size);
    println!("  Records:         {}", result.records);
    println!("  Committed txns:  {}", result.committed_txns);
    println!("  Aborted txns:    {}", result.aborted_txns);
    println!("  In-flight txns:  {}", result.in_flight_txns);
    println!("  Queue depth:     {}", result.queue_depth);
    println!("  Next txn id:     {}", result.next_transaction_id);
    if let Some(torn) = result.torn_tail_bytes {
        println!("  Torn tail:       {torn} bytes (incomplete last append)");
    }
}
