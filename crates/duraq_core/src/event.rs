//! Event payloads carried through the channel.

use std::collections::HashMap;

/// An event flowing through the channel.
///
/// Events are an opaque byte body plus a string-to-string header map
/// (routing metadata, timestamps, host names — the channel does not
/// interpret them). Both may be empty; an empty event is valid and
/// round-trips through the log exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Event {
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

impl Event {
    /// Creates an event with the given headers and body.
    #[must_use]
    pub fn new(headers: HashMap<String, String>, body: Vec<u8>) -> Self {
        Self { headers, body }
    }

    /// Creates an event with an empty header map.
    #[must_use]
    pub fn from_body(body: Vec<u8>) -> Self {
        Self {
            headers: HashMap::new(),
            body,
        }
    }

    /// Returns the header map.
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Returns the body bytes.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Consumes the event, returning its parts.
    #[must_use]
    pub fn into_parts(self) -> (HashMap<String, String>, Vec<u8>) {
        (self.headers, self.body)
    }
}
