//! Published events.

use std::collections::HashMap;

use bytes::Bytes;

/// One published event: an operation name, an encoded payload and a
/// request context. Queues never look inside it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Event {
    /// Operation invoked on the subscriber.
    pub operation: String,
    /// Encoded operation arguments.
    pub payload: Bytes,
    /// Per-request context forwarded to the subscriber.
    pub context: HashMap<String, String>,
}

impl Event {
    /// An event with an empty context.
    pub fn new(operation: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            operation: operation.into(),
            payload: payload.into(),
            context: HashMap::new(),
        }
    }

    /// Add one context entry.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.context.insert(key.into(), value.into());
        self
    }
}
