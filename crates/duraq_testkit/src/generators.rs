//! Property-based test generators using proptest.

use duraq_core::wal::Record;
use duraq_core::{Event, FileId, TransactionId};
use proptest::prelude::*;
use std::collections::HashMap;

/// Strategy for header keys.
pub fn header_key_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_.]{0,15}").expect("invalid regex")
}

/// Strategy for header values (printable ASCII, possibly empty).
pub fn header_value_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[ -~]{0,32}").expect("invalid regex")
}

/// Strategy for event header maps.
pub fn headers_strategy() -> impl Strategy<Value = HashMap<String, String>> {
    prop::collection::hash_map(header_key_strategy(), header_value_strategy(), 0..8)
}

/// Strategy for event bodies (arbitrary bytes, possibly empty).
pub fn body_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..1024)
}

/// Strategy for events.
pub fn event_strategy() -> impl Strategy<Value = Event> {
    (headers_strategy(), body_strategy()).prop_map(|(headers, body)| Event::new(headers, body))
}

/// Strategy for transaction IDs.
pub fn transaction_id_strategy() -> impl Strategy<Value = TransactionId> {
    any::<u64>().prop_map(TransactionId::new)
}

/// Strategy for WAL records across all four variants.
pub fn record_strategy() -> impl Strategy<Value = Record> {
    let base = || (transaction_id_strategy(), any::<u64>());
    prop_oneof![
        (base(), event_strategy()).prop_map(|((txid, ts), event)| {
            let mut record = Record::enqueue(txid, event);
            record.set_timestamp(ts);
            record
        }),
        (base(), any::<u64>(), any::<u64>()).prop_map(|((txid, ts), file, offset)| {
            let mut record = Record::dequeue(txid, FileId::new(file), offset);
            record.set_timestamp(ts);
            record
        }),
        base().prop_map(|(txid, ts)| {
            let mut record = Record::abort(txid);
            record.set_timestamp(ts);
            record
        }),
        base().prop_map(|(txid, ts)| {
            let mut record = Record::commit(txid);
            record.set_timestamp(ts);
            record
        }),
    ]
}
