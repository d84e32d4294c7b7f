//! Dump-log command implementation.

use duraq_core::wal::Record;
use serde::Serialize;
use std::path::Path;

/// WAL record representation for output.
#[derive(Debug, Serialize)]
pub struct RecordInfo {
    /// Offset in the log file.
    pub offset: u64,
    /// Record type.
    pub record_type: String,
    /// Transaction ID.
    pub txid: u64,
    /// Wall-clock timestamp in milliseconds.
    pub timestamp: u64,
    /// Number of event headers (Enqueue only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_count: Option<usize>,
    /// Event body size in bytes (Enqueue only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_size: Option<usize>,
    /// Referenced log file (Dequeue only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_file: Option<u64>,
    /// Referenced offset (Dequeue only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_offset: Option<u64>,
}

impl RecordInfo {
    fn new(offset: u64, record: &Record) -> Self {
        let mut info = Self {
            offset,
            record_type: format!("{:?}", record.record_type()),
            txid: record.transaction_id().as_u64(),
            timestamp: record.timestamp(),
            header_count: None,
            body_size: None,
            ref_file: None,
            ref_offset: None,
        };

        match record {
            Record::Enqueue { event, .. } => {
                info.header_count = Some(event.headers().len());
                info.body_size = Some(event.body().len());
            }
            Record::Dequeue {
                file_id, offset, ..
            } => {
                info.ref_file = Some(file_id.as_u64());
                info.ref_offset = Some(*offset);
            }
            Record::Abort { .. } | Record::Commit { .. } => {}
        }

        info
    }
}

/// Runs the dump-log command.
pub fn run(
    path: &Path,
    limit: Option<usize>,
    skip: usize,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let wal = super::open_log(path)?;
    let max_records = limit.unwrap_or(usize::MAX);

    let mut records = Vec::new();
    for result in wal.iter()?.skip(skip) {
        if records.len() >= max_records {
            break;
        }
        let (offset, record) = result?;
        records.push(RecordInfo::new(offset, &record));
    }

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        _ => {
            print_text_output(&records);
        }
    }

    Ok(())
}

fn print_text_output(records: &[RecordInfo]) {
    println!("Log records ({} shown)", records.len());
    println!();

    for record in records {
        print!(
            "[{:08}] {:8} txid={} ts={}",
            record.offset, record.record_type, record.txid, record.timestamp
        );

        if let Some(count) = record.header_count {
            print!(" headers={count}");
        }
        if let Some(size) = record.body_size {
            print!(" body={size} bytes");
        }
        if let (Some(file), Some(offset)) = (record.ref_file, record.ref_offset) {
            print!(" ref={file}@{offset}");
        }

        println!();
    }
}
